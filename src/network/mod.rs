//! HTTP networking module
//!
//! Provides the HTTP client used by engine backends and the oracle, plus
//! readable-text extraction for result pages.

mod client;
mod extract;
mod user_agent;

pub use client::{deadline_after, HttpClient, MAX_WAIT};
pub use extract::{extract_text, truncate_chars, MAX_PAGE_CHARS};
pub use user_agent::{accept_json, generate_user_agent};
