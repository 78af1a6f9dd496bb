//! Password hashing.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;
use validator::{ValidationError, ValidationErrors};

use crate::config::Argon2 as ArgonConfig;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self, CryptoError> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    /// Hash password using Argon2id with a fresh random salt.
    pub fn hash_password(
        &self,
        password: impl AsRef<[u8]>,
    ) -> Result<String, CryptoError> {
        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        );
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn invalid_password() -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add(
            "password",
            ValidationError::new("invalid_password")
                .with_message("Invalid password".into()),
        );
        errors
    }

    /// Verify password against a PHC string. Parameters are taken from the
    /// stored hash, so older hashes keep verifying after a config change.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> Result<(), ValidationErrors> {
        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        );

        let parsed =
            PasswordHash::new(phc_hash).map_err(|_| Self::invalid_password())?;

        argon2
            .verify_password(password.as_ref(), &parsed)
            .map_err(|_| Self::invalid_password())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PasswordManager {
        PasswordManager::new(Some(ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let pwd = manager();

        let hash = pwd.hash_password("sup3r_s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(pwd.verify_password("sup3r_s3cret", &hash).is_ok());
        assert!(pwd.verify_password("wrong_password", &hash).is_err());
    }

    #[test]
    fn test_rehash_differs_but_both_verify() {
        let pwd = manager();

        let first = pwd.hash_password("sup3r_s3cret").unwrap();
        let second = pwd.hash_password("sup3r_s3cret").unwrap();

        assert_ne!(first, second);
        assert!(pwd.verify_password("sup3r_s3cret", &first).is_ok());
        assert!(pwd.verify_password("sup3r_s3cret", &second).is_ok());
    }

    #[test]
    fn test_garbage_phc_is_rejected() {
        let pwd = manager();
        assert!(pwd.verify_password("sup3r_s3cret", "not-a-phc").is_err());
    }
}
