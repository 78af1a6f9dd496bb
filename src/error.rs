//! Error handler for carta.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("password hashing failed")]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("internal server error, {details}")]
    Internal { details: String },

    #[error("missing or invalid session token")]
    Unauthorized,
}

/// Structure for error responses.
///
/// Every failure leaves the server as
/// `{"success": false, "status": .., "message": ..}`, plus per-field
/// details when validation fails.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    success: bool,
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `message` field.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Add the `errors` field and surface the first violation as the
    /// top-level message.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        let fields = parse_validation_errors(errors);
        if let Some(first) = fields.first() {
            self.message = first.message.clone();
        }
        self.errors = Some(fields);
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            success: false,
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: "Internal server error".to_owned(),
            errors: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect();

    // Deterministic message selection.
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default().status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => {
                response.errors(validation_errors)
            },

            ServerError::Axum(rejection) => {
                response.message(&rejection.body_text())
            },

            ServerError::Sql(SQLxError::RowNotFound) => response
                .status(StatusCode::NOT_FOUND)
                .message("User not found"),

            ServerError::Sql(err) => {
                tracing::error!(error = %err, "sql request failed");
                ResponseError::default()
            },

            ServerError::Forbidden(message) => {
                response.status(StatusCode::FORBIDDEN).message(message)
            },

            ServerError::Conflict(message) => {
                response.status(StatusCode::CONFLICT).message(message)
            },

            ServerError::Crypto(err) => {
                tracing::error!(error = %err, "password hashing failed");
                ResponseError::default()
            },

            ServerError::Token(err) => {
                tracing::error!(error = %err, "token signing failed");
                ResponseError::default()
            },

            ServerError::Internal { details } => {
                tracing::error!(%details, "server returned 500 status");
                ResponseError::default()
            },

            ServerError::Unauthorized => response
                .status(StatusCode::UNAUTHORIZED)
                .message("Missing or invalid session token"),
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "success": false,
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "message": "Internal server error",
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
