//! HTTP API.
pub mod create;
pub mod login;
pub mod menu;
pub mod signout;
pub mod status;
pub mod users;

use std::sync::LazyLock;

use axum::Json;
use axum::extract::{FromRequest, Request};
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::ServerError;

/// Cookie carrying the session token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9]+$").unwrap());

/// Usernames are lowercase alphanumeric, without whitespace.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("username_whitespace")
            .with_message("Username can't contain spaces".into()));
    }

    if username != username.to_lowercase() {
        return Err(ValidationError::new("username_case")
            .with_message("Username must be lowercase".into()));
    }

    if !USERNAME.is_match(username) {
        return Err(ValidationError::new("username_charset")
            .with_message("Username can only contain letters and numbers".into()));
    }

    Ok(())
}

/// JSON extractor which also checks `validator` rules.
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state).await?;
        body.validate()?;
        Ok(Valid(body))
    }
}

#[cfg(test)]
pub(crate) fn state(pool: sqlx::Pool<sqlx::Postgres>) -> crate::AppState {
    use std::sync::Arc;

    // Low-cost parameters to keep tests fast.
    let argon2 = crate::config::Argon2 {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    };

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        db: crate::database::Database { postgres: pool },
        crypto: Arc::new(
            crate::crypto::PasswordManager::new(Some(argon2))
                .expect("cannot create password manager"),
        ),
        token: crate::token::TokenManager::new(
            "http://localhost",
            "test-secret-key",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_accepts_lowercase_alphanumerics() {
        assert!(validate_username("john123").is_ok());
        assert!(validate_username("chefmario").is_ok());
    }

    #[test]
    fn test_validate_username_rejects_whitespace() {
        let err = validate_username("john 123").unwrap_err();
        assert_eq!(err.to_string(), "Username can't contain spaces");
    }

    #[test]
    fn test_validate_username_rejects_uppercase() {
        let err = validate_username("John123").unwrap_err();
        assert_eq!(err.to_string(), "Username must be lowercase");
    }

    #[test]
    fn test_validate_username_rejects_symbols() {
        let err = validate_username("john_123").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Username can only contain letters and numbers"
        );
    }
}
