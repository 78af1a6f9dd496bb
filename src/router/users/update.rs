//! Update user data.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::router::Valid;
use crate::router::users::Session;
use crate::user::{User, UserPatch, UserRepository};
use crate::{AppState, ServerError};

const NOT_ALLOWED: &str = "You are not allowed to update this user";

#[derive(Debug, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(
        length(
            min = 7,
            max = 20,
            message = "Username must be between 7 and 20 characters"
        ),
        custom(function = "crate::router::validate_username")
    )]
    username: Option<String>,
    #[validate(email(message = "Email must be formatted."))]
    email: Option<String>,
    #[validate(length(
        min = 6,
        message = "Password can't be less than 6 characters"
    ))]
    password: Option<String>,
    profile_picture: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(flatten)]
    pub user: User,
    pub success: bool,
}

/// Handler to patch the fields a user sent. Absent fields stay untouched.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(session): Extension<Session>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>, ServerError> {
    if session.user_id != user_id {
        return Err(ServerError::Forbidden(NOT_ALLOWED));
    }

    // Passwords land in the database as PHC strings only.
    let password = body
        .password
        .map(|password| state.crypto.hash_password(&password))
        .transpose()?;

    let patch = UserPatch {
        username: body.username,
        email: body.email,
        password,
        profile_picture: body.profile_picture,
    };
    let user = UserRepository::new(state.db.postgres.clone())
        .update(&user_id, &patch)
        .await?;

    Ok(Json(Response {
        user,
        success: true,
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create("admin").unwrap();

        let response = make_request(
            Some(&token),
            app,
            Method::PATCH,
            "/users/admin",
            json!({
                "username": "trattoria",
                "profilePicture": "https://bucket.test/123chef.png",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["username"], "trattoria");
        assert_eq!(body["profilePicture"], "https://bucket.test/123chef.png");
        // Untouched fields keep their stored value.
        assert_eq!(body["email"], "admin@carta.test");
        assert!(body.get("password").is_none());
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_another_user_is_forbidden(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create("someone-else").unwrap();

        let response = make_request(
            Some(&token),
            app,
            Method::PATCH,
            "/users/admin",
            json!({"username": "trattoria"}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "You are not allowed to update this user");
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_rejects_bad_usernames(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create("admin").unwrap();

        let cases = [
            ("mario", "Username must be between 7 and 20 characters"),
            ("john 123", "Username can't contain spaces"),
            ("John1234", "Username must be lowercase"),
            ("john_123", "Username can only contain letters and numbers"),
        ];

        for (username, message) in cases {
            let response = make_request(
                Some(&token),
                app.clone(),
                Method::PATCH,
                "/users/admin",
                json!({"username": username}).to_string(),
            )
            .await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body =
                response.into_body().collect().await.unwrap().to_bytes();
            let body: serde_json::Value =
                serde_json::from_slice(&body).unwrap();
            assert_eq!(body["message"], message);
        }
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_rejects_short_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create("admin").unwrap();

        let response = make_request(
            Some(&token),
            app,
            Method::PATCH,
            "/users/admin",
            json!({"password": "12345"}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Password can't be less than 6 characters");
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_duplicate_username_conflicts(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create("admin").unwrap();

        let response = make_request(
            Some(&token),
            app,
            Method::PATCH,
            "/users/admin",
            json!({"username": "competitor"}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], user::USERNAME_TAKEN);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_requires_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::PATCH,
            "/users/admin",
            json!({"username": "trattoria"}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Missing or invalid session token");
    }
}
