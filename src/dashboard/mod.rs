//! Headless state for the menu dashboard.

mod http;

pub use http::*;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::menu::{Dish, DishDraft, MISSING_FIELDS};
use crate::storage::{UploadEvent, Uploader};

pub const UPLOAD_FAILED: &str = "Error uploading image";

/// Errors surfaced by a [`MenuApi`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),
    /// Server refusal. Carries the message verbatim.
    #[error("{0}")]
    Rejected(String),
}

/// Backend operations the dashboard depends on.
#[async_trait]
pub trait MenuApi: Send + Sync {
    async fn list_menu(&self, restaurant_id: &str)
    -> Result<Vec<Dish>, ApiError>;

    async fn create_dish(
        &self,
        restaurant_id: &str,
        draft: &DishDraft,
    ) -> Result<Dish, ApiError>;
}

/// What the dashboard shows right now.
#[derive(Debug, PartialEq)]
pub enum MenuView<'a> {
    Loading,
    Cards(&'a [Dish]),
    AddDish(&'a DishDraft),
}

/// Drives the menu screen without any rendering attached.
pub struct Dashboard {
    api: Arc<dyn MenuApi>,
    uploader: Uploader,
    restaurant_id: String,
    menu: Vec<Dish>,
    loading: bool,
    form_loading: bool,
    adding: bool,
    draft: DishDraft,
    upload_progress: u8,
    error_message: Option<String>,
}

impl Dashboard {
    /// Create a new [`Dashboard`] for one restaurant.
    pub fn new(
        api: Arc<dyn MenuApi>,
        uploader: Uploader,
        restaurant_id: &str,
    ) -> Self {
        Self {
            api,
            uploader,
            restaurant_id: restaurant_id.to_owned(),
            menu: Vec::new(),
            loading: true,
            form_loading: false,
            adding: false,
            draft: DishDraft::default(),
            upload_progress: 0,
            error_message: None,
        }
    }

    /// What to render right now.
    pub fn view(&self) -> MenuView<'_> {
        if self.loading {
            return MenuView::Loading;
        }

        if !self.adding && !self.menu.is_empty() {
            return MenuView::Cards(&self.menu);
        }

        // An empty menu falls through to the add-dish form.
        MenuView::AddDish(&self.draft)
    }

    pub fn menu(&self) -> &[Dish] {
        &self.menu
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn upload_progress(&self) -> u8 {
        self.upload_progress
    }

    pub fn form_loading(&self) -> bool {
        self.form_loading
    }

    /// Switch between the cards and the add-dish form.
    pub fn toggle_add_new(&mut self) {
        self.adding = !self.adding;
    }

    pub fn set_name(&mut self, name: &str) {
        self.draft.name = trimmed(name);
    }

    pub fn set_description(&mut self, description: &str) {
        self.draft.description = trimmed(description);
    }

    /// Keep only parseable, finite prices.
    pub fn set_price(&mut self, price: &str) {
        self.draft.price =
            price.trim().parse::<f64>().ok().filter(|price| price.is_finite());
    }

    /// Reload the menu. A failed fetch degrades to an empty menu.
    pub async fn refresh_menu(&mut self) {
        self.loading = true;

        match self.api.list_menu(&self.restaurant_id).await {
            Ok(menu) => self.menu = menu,
            Err(err) => {
                tracing::error!(error = %err, "cannot fetch menu");
                self.menu = Vec::new();
            },
        }

        self.loading = false;
    }

    /// Upload a local image and point the draft at the resulting
    /// object URL. Progress lands in [`Self::upload_progress`].
    pub async fn attach_image(&mut self, path: impl Into<PathBuf>) {
        self.error_message = None;
        self.upload_progress = 0;

        let mut task = self.uploader.upload(path);
        while let Some(event) = task.next_event().await {
            match event {
                UploadEvent::Progress(value) => self.upload_progress = value,
                UploadEvent::Complete(url) => self.draft.image = Some(url),
                UploadEvent::Failed(err) => {
                    tracing::error!(error = %err, "image upload failed");
                    self.error_message = Some(UPLOAD_FAILED.to_owned());
                },
            }
        }
    }

    /// Submit the draft. An incomplete form never reaches the server.
    pub async fn submit(&mut self) {
        self.error_message = None;

        if !self.draft.is_complete() {
            self.error_message = Some(MISSING_FIELDS.to_owned());
            return;
        }

        self.form_loading = true;
        let result =
            self.api.create_dish(&self.restaurant_id, &self.draft).await;
        self.form_loading = false;

        match result {
            Ok(_) => {
                self.refresh_menu().await;
                self.draft = DishDraft::default();
                self.upload_progress = 0;
                self.adding = false;
            },
            Err(err) => self.error_message = Some(err.to_string()),
        }
    }
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
