//! deepsearch-rs: an iterative multi-engine deep-search service
//!
//! A session queries one or more search engines in rounds, merges the
//! deduplicated results into an evidence set, and asks a sufficiency oracle
//! after every round whether the evidence answers the query or which
//! refined query to try next. Sessions stop when the oracle is satisfied,
//! the iteration budget is spent, an unrecoverable error occurs or the
//! caller cancels.

pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod metrics;
pub mod network;
pub mod oracle;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use engines::{EngineClient, EngineRegistry};
pub use error::{ErrorKind, SearchError};
pub use oracle::{Analysis, SufficiencyOracle};
pub use results::{EvidenceSet, SearchResult};
pub use search::{DeepSearch, DeepSearchRequest, SessionReport, SessionStatus};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
