use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Field-level validation messages, keyed by field name
///
/// Nested fields use dotted keys (`category.name`) and list entries use an
/// index (`tags[1].name`).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
    #[error("Not found.")]
    NotFound,
    #[error("Validation failed for fields: {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
    Validation(FieldErrors),
    #[error("A category with this name already exists.")]
    DuplicateCategory,
    #[error("{0}")]
    BadRequest(String),
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,
    #[error("Invalid token.")]
    InvalidToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl ApiError {
    /// Builds a validation error carrying a single message for one field
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Database(err) => {
                error!("Request failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, json!(errors)),
            ApiError::DuplicateCategory => (
                StatusCode::BAD_REQUEST,
                json!({ "detail": "A category with this name already exists." }),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "detail": msg })),
            ApiError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": "Authentication credentials were not provided." }),
            ),
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, json!({ "detail": "Invalid token." })),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "Invalid credentials" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

/// Reports which `table.column` a unique constraint failure was raised for
///
/// SQLite words these as `UNIQUE constraint failed: items.sku`; the column
/// part is returned so callers can tell which field collided.
pub fn unique_violation_target(err: &anyhow::Error) -> Option<&str> {
    match err.downcast_ref::<DieselError>() {
        Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
            let message = info.message();
            Some(message.rsplit(": ").next().unwrap_or(message))
        }
        _ => None,
    }
}

/// Whether an error is a unique violation on the given `table.column`
pub fn is_unique_violation(err: &anyhow::Error, column: &str) -> bool {
    unique_violation_target(err).is_some_and(|target| target.split(", ").any(|c| c == column))
}
