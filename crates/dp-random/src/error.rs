//! Randomness error types

use thiserror::Error;

/// Randomness error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RandomError {
    /// Rejected client-side, nothing was sent
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Network failure, non-success status or malformed body
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
}
