//! [`MenuApi`] implementation over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::dashboard::{ApiError, MenuApi};
use crate::menu::{Dish, DishDraft};

/// Error payload returned by the server.
#[derive(Debug, Deserialize)]
struct Failure {
    message: String,
}

/// Backend client for the dashboard.
#[derive(Clone)]
pub struct HttpMenuApi {
    http: Client,
    base_url: String,
}

impl HttpMenuApi {
    /// Create a new [`HttpMenuApi`] against `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[async_trait]
impl MenuApi for HttpMenuApi {
    async fn list_menu(
        &self,
        restaurant_id: &str,
    ) -> Result<Vec<Dish>, ApiError> {
        let response = self
            .http
            .get(format!("{}/menu/{}", self.base_url, restaurant_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Transport(
                "Network response was not ok".to_owned(),
            ));
        }

        Ok(response.json().await?)
    }

    async fn create_dish(
        &self,
        restaurant_id: &str,
        draft: &DishDraft,
    ) -> Result<Dish, ApiError> {
        let mut body = serde_json::to_value(draft)
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        body["restaurantid"] = restaurant_id.into();

        let response = self
            .http
            .post(format!("{}/menu/createRecepie", self.base_url))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let failure: Failure = response.json().await?;
            Err(ApiError::Rejected(failure.message))
        }
    }
}
