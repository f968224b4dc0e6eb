use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crm_kanban_core::ItemId;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{label} {id} not found")]
    NotFound { label: &'static str, id: ItemId },
    #[error("missing capability {0}")]
    Forbidden(&'static str),
    /// A field-level problem, rendered as `{ message, errors: { field: [..] } }`.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    #[error("status updates are switched off")]
    UpdatesDisabled,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound { label, id } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": format!("{label} #{id} no longer exists.") })),
            )
                .into_response(),
            ApiError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": "This action is unauthorized." })),
            )
                .into_response(),
            ApiError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "The given data was invalid.",
                    "errors": { field: [message] },
                })),
            )
                .into_response(),
            // No `message`: the client shows its own generic failure text.
            ApiError::UpdatesDisabled => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "simulated failure" })),
            )
                .into_response(),
        }
    }
}
