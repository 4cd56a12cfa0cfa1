//! Error types for the load consolidation optimizer.
//!
//! Only invalid input and failing collaborators are errors. Data gaps and
//! constraint violations are reported as warnings and flags on the result.

use thiserror::Error;

/// Errors raised while validating a request or talking to collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// A request parameter failed validation; nothing was computed.
    #[error("invalid parameter `{field}`: {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        field: &'static str,
        /// Human readable explanation for the planner.
        message: String,
    },
    /// The order snapshot provider could not supply orders.
    #[error("failed to load order snapshot for origin {origin}: {message}")]
    Snapshot {
        /// Origin the snapshot was requested for.
        origin: String,
        /// Description of the provider failure.
        message: String,
    },
    /// The persistence sink rejected the draft loads; nothing was written.
    #[error("failed to persist draft loads: {message}")]
    Persistence {
        /// Description of the sink failure.
        message: String,
    },
    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Encoding or decoding JSON failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an [`Error::InvalidParameter`].
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            field,
            message: message.into(),
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
