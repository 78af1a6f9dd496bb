use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::{User, UserRepository};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        length(
            min = 7,
            max = 20,
            message = "Username must be between 7 and 20 characters"
        ),
        custom(function = "crate::router::validate_username")
    )]
    pub username: String,
    #[validate(email(message = "Email must be formatted."))]
    email: String,
    #[validate(length(
        min = 6,
        message = "Password can't be less than 6 characters"
    ))]
    password: String,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<User>)> {
    let user = User {
        id: crate::id::generate(),
        username: body.username,
        email: body.email,
        password: state.crypto.hash_password(&body.password)?,
        profile_picture: None,
        created_at: chrono::Utc::now(),
    };

    UserRepository::new(state.db.postgres.clone())
        .insert(&user)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
