//! API error types and their HTTP mapping.
//!
//! Validation problems become 400, unknown ids become 404, and anything
//! that went wrong in the database becomes a generic 500. Errors are
//! rendered as a JSON body with a single `message` field.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::schema::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body failed domain validation (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request could not be parsed at all (400)
    #[error("{0}")]
    BadRequest(String),

    /// No Todo with the given id (404)
    #[error("Todo with ID: {0} not found")]
    NotFound(i32),

    /// Backend failure, surfaced unmodified by the repository (500)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Database(e) => {
                // Log the actual error, return a non-leaking message
                tracing::error!("database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "something went wrong while talking to the database".to_owned(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.to_string())
    }
}
