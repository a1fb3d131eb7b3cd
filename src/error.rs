//! Error types for campus insights
//!
//! The analytics engine itself is total and never fails. These errors cover
//! the surfaces around it: JSON input, configuration, and insight stores.

use thiserror::Error;

/// Errors that can occur outside the pure computation
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Failed to parse input: {0}")]
    Parse(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Insights store error: {0}")]
    Store(String),
}
