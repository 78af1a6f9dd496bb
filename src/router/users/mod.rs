//! Users-related HTTP API.
pub mod delete;
pub mod update;

use axum::extract::{Request, State};
use axum::http::header;
use axum::response::Response;
use axum::routing::{delete, patch};
use axum::{Router, middleware};
use axum_extra::extract::CookieJar;

use crate::router::ACCESS_TOKEN_COOKIE;
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";

/// Canonical session identity for authorization checks.
#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: String,
}

/// Custom middleware for authentification.
/// The session cookie wins over an `Authorization` header.
async fn auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: middleware::Next,
) -> Result<Response, ServerError> {
    let token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok())
                .map(|header| header.replace(BEARER, ""))
        });

    let Some(token) = token else {
        return Err(ServerError::Unauthorized);
    };
    let claims = state
        .token
        .decode(&token)
        .map_err(|_| ServerError::Unauthorized)?;

    req.extensions_mut().insert(Session {
        user_id: claims.sub,
    });
    Ok(next.run(req).await)
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `PATCH /users/{user_id}` goes to `update`. Authorization required.
        .route("/{user_id}", patch(update::handler))
        // `DELETE /users/{user_id}` goes to `delete`. Authorization required.
        .route("/{user_id}", delete(delete::handler))
        .route_layer(middleware::from_fn_with_state(state, auth))
}
