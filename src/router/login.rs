//! Open a session from email and password credentials.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{ACCESS_TOKEN_COOKIE, Valid};
use crate::user::{User, UserRepository};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: String,
    #[validate(length(
        min = 6,
        message = "Password can't be less than 6 characters"
    ))]
    password: String,
}

/// Handler to open a session and set its cookie.
pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Valid(body): Valid<Body>,
) -> Result<(CookieJar, Json<User>)> {
    let user = UserRepository::new(state.db.postgres.clone())
        .find_by_email(&body.email)
        .await?;

    state.crypto.verify_password(&body.password, &user.password)?;

    let token = state.token.create(&user.id)?;
    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Json(user)))
}
