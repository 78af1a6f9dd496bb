mod repository;

pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

pub const MISSING_FIELDS: &str = "Please fill out all fields";

/// Dish as saved on database.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// In-progress dish form. Fields stay `None` until filled in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DishDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A fully filled dish form, ready to be stored.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDish {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
}

impl DishDraft {
    /// Whether every field holds a usable value.
    pub fn is_complete(&self) -> bool {
        self.complete().is_ok()
    }

    /// Turn the draft into a [`NewDish`]. Text fields are trimmed,
    /// blank ones count as missing.
    pub fn complete(&self) -> Result<NewDish, ValidationErrors> {
        let name = trimmed(self.name.as_deref());
        let description = trimmed(self.description.as_deref());
        let image = trimmed(self.image.as_deref());

        match (name, description, self.price, image) {
            (Some(name), Some(description), Some(price), Some(image)) => {
                Ok(NewDish {
                    name,
                    description,
                    price,
                    image,
                })
            },
            _ => Err(missing_fields()),
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// A [`ValidationErrors`] carrying the canonical missing-fields message.
pub fn missing_fields() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "fields",
        ValidationError::new("missing_fields")
            .with_message(MISSING_FIELDS.into()),
    );
    errors
}
