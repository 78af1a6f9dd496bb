//! Menu-related HTTP API.
pub mod create;
pub mod list;

use axum::Router;
use axum::routing::{get, post};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /menu/createRecepie` goes to `create`.
        .route("/createRecepie", post(create::handler))
        // `GET /menu/{restaurant_id}` goes to `list`.
        .route("/{restaurant_id}", get(list::handler))
}
