//! Register a new dish.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::menu::{Dish, DishDraft, DishRepository, missing_fields};
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[serde(flatten)]
    pub draft: DishDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurantid: Option<String>,
}

/// Handler to register a dish on a restaurant menu.
/// Incomplete forms are refused before touching the database.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Dish>> {
    let new = body.draft.complete()?;
    let Some(restaurant_id) = body
        .restaurantid
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return Err(missing_fields().into());
    };

    let dish = DishRepository::new(state.db.postgres.clone())
        .insert(restaurant_id, new)
        .await?;

    Ok(Json(dish))
}
