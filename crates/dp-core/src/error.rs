//! Error types for the winner ledger

use thiserror::Error;

/// Ledger error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Participant already exists: {name}")]
    DuplicateParticipant { name: String },

    #[error("Participant {name} is a recorded winner and cannot be removed")]
    ParticipantIsWinner { name: String },

    #[error("Roster is locked while winners are recorded")]
    RosterLocked,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Unknown prize: {0}")]
    UnknownPrize(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("All {quantity} slots of prize {prize_id} are already filled")]
    SlotsExhausted { prize_id: String, quantity: u32 },

    #[error("Slot {index} of prize {prize_id} has no winner yet")]
    IndexNotFilled { prize_id: String, index: usize },

    #[error("Session {session_id} does not allow reshuffling")]
    SessionNotReshufflable { session_id: String },
}

/// Persistence error type
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type LedgerResult<T> = Result<T, LedgerError>;
