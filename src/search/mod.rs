//! Deep-search orchestration
//!
//! Drives sessions of search rounds against the engine registry, merges
//! evidence and consults the sufficiency oracle between rounds.

mod executor;
mod log;
mod models;
mod orchestrator;
mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use executor::{RoundExecutor, RoundOutcome};
pub use log::{log_file_name, write_session_log};
pub use models::*;
pub use orchestrator::DeepSearch;
pub use report::terminal_state;
