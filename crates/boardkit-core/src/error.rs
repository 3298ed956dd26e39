//! Engine errors.
//!
//! Missing ids, rejected invariants and clamped sizes are reported through
//! `Option`/`bool` return values. Only conditions a caller cannot recover from
//! locally end up here.

use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No document is loaded")]
    NotInitialized,
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
