//! # dp-random - Doorprize Randomness
//!
//! Uniform permutations for the draw. Prefers an external true-random
//! provider and falls back to a local Fisher–Yates shuffle with rejection
//! sampling whenever the provider cannot be used.
//!
//! ## Architecture
//!
//! ```text
//! RandomSource::permute(items)
//!     │
//!     ├── RandomProvider (HttpRandomProvider → randomness proxy)
//!     │       └── ProviderRequest (1 ≤ count ≤ max, count ≤ 10 000)
//!     │
//!     └── local_shuffle (thread CSPRNG, unbiased index draws)
//! ```

pub mod error;
pub mod provider;
pub mod shuffle;
pub mod source;

pub use error::*;
pub use provider::*;
pub use shuffle::*;
pub use source::*;
