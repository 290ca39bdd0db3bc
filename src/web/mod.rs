//! Web server module
//!
//! Exposes deep-search sessions, the engine list and statistics over HTTP.

mod handlers;
mod routes;
mod state;

pub use handlers::{DeepSearchResponse, EngineInfo, SourceResponse};
pub use routes::create_router;
pub use state::AppState;
