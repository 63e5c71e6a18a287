//! Error types for the hash state store.

use crate::subscriptions::SubscriptionId;
use thiserror::Error;

/// Errors from the fallible surfaces around the store.
///
/// State operations never fail; these cover configuration and subscriptions.
#[derive(Debug, Error)]
pub enum HashStateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Subscription not found: {0:?}")]
    SubscriptionNotFound(SubscriptionId),
}

impl From<serde_json::Error> for HashStateError {
    fn from(e: serde_json::Error) -> Self {
        HashStateError::Config(e.to_string())
    }
}

/// Result type for hash state operations.
pub type Result<T> = std::result::Result<T, HashStateError>;
