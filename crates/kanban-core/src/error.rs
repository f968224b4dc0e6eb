use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{ColumnId, ItemId};

/// Why a status-update request did not succeed.
///
/// Every variant rolls the board back; the distinction only changes the
/// message shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded with {status}: {message}")]
    Server { status: u16, message: String },

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },

    #[error("unexpected response: {0}")]
    Decode(String),
}

pub const GENERIC_FAILURE: &str = "Failed to update status. Please try again.";

impl UpdateError {
    /// Message for the notification surface: the server's own wording when
    /// there is one, a generic sentence otherwise.
    pub fn user_message(&self) -> String {
        match self {
            UpdateError::Validation { message, errors } => errors
                .values()
                .flatten()
                .next()
                .cloned()
                .or_else(|| non_empty(message))
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            UpdateError::Server { message, .. } => {
                non_empty(message).unwrap_or_else(|| GENERIC_FAILURE.to_string())
            }
            UpdateError::Transport(_) | UpdateError::Decode(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

fn non_empty(message: &str) -> Option<String> {
    let trimmed = message.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A drop that cannot be turned into a board move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("column {0} is not on this board")]
    UnknownColumn(ColumnId),

    #[error("item {item} is not in column {column}")]
    ItemNotFound { item: ItemId, column: ColumnId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_prefers_first_field_error() {
        let mut errors = BTreeMap::new();
        errors.insert(
            "lead_status_id".to_string(),
            vec!["The selected lead status id is invalid.".to_string()],
        );
        let err = UpdateError::Validation {
            message: "The given data was invalid.".into(),
            errors,
        };
        assert_eq!(err.user_message(), "The selected lead status id is invalid.");
    }

    #[test]
    fn transport_errors_use_generic_wording() {
        let err = UpdateError::Transport("connection reset".into());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        let err = UpdateError::Server {
            status: 500,
            message: "  ".into(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }
}
