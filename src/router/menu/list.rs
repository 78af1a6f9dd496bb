//! List the menu of one restaurant.

use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::Result;
use crate::menu::{Dish, DishRepository};

/// Handler returning every dish of a restaurant, oldest first.
pub async fn handler(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<Vec<Dish>>> {
    let dishes = DishRepository::new(state.db.postgres.clone())
        .list_by_restaurant(&restaurant_id)
        .await?;

    Ok(Json(dishes))
}

#[cfg(test)]
pub(super) mod tests {
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    #[sqlx::test(fixtures("../../../fixtures/dishes.sql"))]
    async fn test_list_menu(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::GET,
            "/menu/trattoria",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let dishes: Vec<menu::Dish> = serde_json::from_slice(&body).unwrap();
        assert_eq!(dishes.len(), 2);
        assert_eq!(dishes[0].name, "Margherita");
        assert_eq!(dishes[1].name, "Tiramisu");
    }

    #[sqlx::test(fixtures("../../../fixtures/dishes.sql"))]
    async fn test_list_unknown_restaurant_is_empty(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::GET,
            "/menu/nowhere",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"[]");
    }
}
