//! The core error taxonomy.
//!
//! Every subsystem surfaces one of these variants rather than an untyped
//! exception; the facade that would sit in front of this core maps each
//! variant onto an HTTP status code.

use thiserror::Error;

/// Shared error taxonomy across storage, mempool, block production, and
/// chain sync.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Malformed request or transaction: bad hex, missing field, bad fee.
    #[error("validation error: {0}")]
    Validation(String),

    /// Queried entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate block/transaction insertion.
    #[error("conflict: {0}")]
    Conflict(String),

    /// I/O or commit failure in the storage layer.
    #[error("storage error: {0}")]
    Storage(String),

    /// Fall-through for anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Validation(err.to_string())
    }
}
