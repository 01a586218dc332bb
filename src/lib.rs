//! ademe-harvest - PDF discovery and harvesting for ADEME publication feeds.
//!
//! Core library: page discovery strategies, the harvest orchestrator, and the
//! durable record store. The `harvest` binary wraps it in a CLI.

// Model types use `from_str` methods that return Option<Self>,
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

pub mod cli;
pub mod config;
pub mod discovery;
pub mod http_client;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
pub mod utils;
