//! Close the current session.

use axum::Json;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;

use crate::router::ACCESS_TOKEN_COOKIE;

pub const SIGNED_OUT: &str = "User has been signed out";

/// Handler to clear the session cookie.
pub async fn handler(jar: CookieJar) -> (CookieJar, Json<&'static str>) {
    let cookie = Cookie::build(ACCESS_TOKEN_COOKIE).path("/");
    (jar.remove(cookie), Json(SIGNED_OUT))
}

#[cfg(test)]
pub(super) mod tests {
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    #[sqlx::test]
    async fn test_signout_clears_cookie(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/signout",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("missing removal cookie");
        assert!(cookie.starts_with("access_token="));
        assert!(cookie.contains("Max-Age=0"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"\"User has been signed out\"");
    }
}
