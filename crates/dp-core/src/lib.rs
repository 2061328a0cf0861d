//! # dp-core - Doorprize Winner Ledger
//!
//! Data model and invariants for a live prize drawing: the participant roster,
//! prizes grouped into sessions, and the winner assignment.
//!
//! ## Architecture
//!
//! ```text
//! WinnerLedger
//!     │
//!     ├── EventState (roster, sessions → prizes, winners, locked)
//!     └── StateStore (MemoryStore | JsonFileStore)
//! ```

mod error;
mod ledger;
mod model;
mod storage;

pub use error::*;
pub use ledger::*;
pub use model::*;
pub use storage::*;
