use std::string::FromUtf8Error;

use thiserror::Error;

use crate::accessibility::Accessibility;
use crate::attributes::AttrKey;
use crate::status::Status;

/// Main error type for keychain operations
#[derive(Error, Debug)]
pub enum KeychainError {
    #[error("Item not found")]
    NotFound,

    #[error("Store error: {0}")]
    Store(Status),

    #[error("Stored secret for `{identifier}` is not valid UTF-8")]
    Decode {
        identifier: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("Store response is missing the {0:?} attribute")]
    MissingAttribute(AttrKey),

    #[error("Accessibility policy `{policy}` is not supported by the {backend} store")]
    UnsupportedAccessibility {
        policy: Accessibility,
        backend: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Async task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl KeychainError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            KeychainError::NotFound | KeychainError::Store(Status::ItemNotFound)
        )
    }

    /// Check if retrying later could succeed, e.g. once the device unlocks
    pub fn is_recoverable(&self) -> bool {
        match self {
            KeychainError::Store(Status::InteractionNotAllowed) => true,
            KeychainError::Store(Status::UserCanceled) => true,
            KeychainError::Store(Status::NotAvailable) => true,
            KeychainError::Join(_) => true,
            _ => false,
        }
    }

    /// The store status behind this error, if any
    pub fn status(&self) -> Option<Status> {
        match self {
            KeychainError::Store(status) => Some(*status),
            KeychainError::NotFound => Some(Status::ItemNotFound),
            _ => None,
        }
    }
}

impl From<Status> for KeychainError {
    fn from(status: Status) -> Self {
        match status {
            Status::ItemNotFound => KeychainError::NotFound,
            other => KeychainError::Store(other),
        }
    }
}

/// Result type for keychain operations
pub type Result<T> = std::result::Result<T, KeychainError>;
