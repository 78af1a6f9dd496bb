//! Record identifier generation.

use rand::RngCore;
use rand::rngs::OsRng;

const ID_BYTES: usize = 12;

/// Generate an opaque, 24-character hexadecimal record identifier.
pub fn generate() -> String {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
