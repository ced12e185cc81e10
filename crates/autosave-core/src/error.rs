//! Error types shared by the auto-save core.

use thiserror::Error;

use crate::status::{SaveEvent, SaveStatus};

/// Failure reported by an injected save operation.
///
/// Carries the human-readable message surfaced to the save indicator, plus
/// the underlying error when one exists.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SaveError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl SaveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, using its `Display` output as the message.
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CoreError> for SaveError {
    fn from(err: CoreError) -> Self {
        Self::from_source(err)
    }
}

/// Illegal move in the save status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal save status transition: {event:?} while {from}")]
pub struct TransitionError {
    pub from: SaveStatus,
    pub event: SaveEvent,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown save status: {0}")]
    UnknownStatus(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
