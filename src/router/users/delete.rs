//! Delete user account.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::router::users::Session;
use crate::user::UserRepository;
use crate::{AppState, ServerError};

const NOT_ALLOWED: &str = "You are not allowed to delete this user";

pub const DELETED: &str = "User has been deleted";

/// Handler to delete the authenticated user.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Json<&'static str>, ServerError> {
    if session.user_id != user_id {
        return Err(ServerError::Forbidden(NOT_ALLOWED));
    }

    UserRepository::new(state.db.postgres.clone())
        .delete(&user_id)
        .await?;

    Ok(Json(DELETED))
}
