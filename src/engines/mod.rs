//! Search engine module
//!
//! Defines the `EngineClient` capability, the HTTP backends implementing it
//! and the registry resolving engine ids to clients.

mod client;
mod loader;
mod registry;
mod traits;

// Engine implementations
pub mod arxiv;
pub mod bing;
pub mod duckduckgo;
pub mod google;
pub mod serpapi;
pub mod wikipedia;

pub use client::HttpEngineClient;
pub use loader::EngineLoader;
pub use registry::EngineRegistry;
pub use traits::*;
