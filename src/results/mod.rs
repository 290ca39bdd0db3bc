//! Result types and the evidence set
//!
//! Engines return raw hits; the round executor normalizes them into
//! immutable search results which accumulate in a session's evidence set.

mod container;
mod types;

pub use container::EvidenceSet;
pub use types::*;
