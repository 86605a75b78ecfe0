//! Error types for the audit engine
//!
//! Only structurally invalid input is an error. Numeric edge cases (zero
//! totals, empty samples, non-positive variance) resolve to documented
//! boundary values inside each operation instead.

use thiserror::Error;

/// Errors surfaced by ingestion and configuration
#[derive(Error, Debug)]
pub enum AuditError {
    /// A single row or histogram is missing required fields or has the wrong
    /// shape. Batch ingestion rejects only the offending item.
    #[error("Invalid input shape for {item}: {reason}")]
    InputShape { item: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditError {
    pub(crate) fn input_shape(item: impl Into<String>, reason: impl ToString) -> Self {
        Self::InputShape {
            item: item.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for audit engine operations
pub type Result<T> = std::result::Result<T, AuditError>;
