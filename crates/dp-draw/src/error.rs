//! Draw error types

use dp_core::LedgerError;
use thiserror::Error;

/// Draw error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Not enough participants: need {need}, have {have}")]
    InsufficientCandidates { need: usize, have: usize },

    #[error("No available candidates left to draw from")]
    NoCandidates,

    #[error("A draw is already in progress")]
    DrawInProgress,
}

impl DrawError {
    /// True when the ledger refused a reshuffle for its session policy
    pub fn is_not_reshufflable(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::SessionNotReshufflable { .. }))
    }
}
