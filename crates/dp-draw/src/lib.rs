//! # dp-draw - Doorprize Draw Engine
//!
//! Allocates winners and drives the staggered reveal of committed results.
//!
//! ## Architecture
//!
//! ```text
//! DrawOrchestrator ──batch_draw / reshuffle──► WinnerLedger (commit)
//!     │       │
//!     │       └── RandomSource::permute(available candidates)
//!     │
//!     └── DrawOutcome { allocations, DrawLease }
//!             │
//!             ▼
//!     RevealScheduler ──► RevealEvent stream ──► renderer (SlotView)
//!             │
//!             └── lease dropped on Idle ──► next draw allowed
//! ```

mod error;
mod lock;
mod orchestrator;
mod reveal;
mod timing;
mod view;

pub use error::*;
pub use lock::*;
pub use orchestrator::*;
pub use reveal::*;
pub use timing::*;
pub use view::*;
