//! Error types for the auto-save runtime.

use autosave_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("auto-save controller is shut down")]
    Closed,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("controller task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
