//! Library entrypoint for scores-relay.
//!
//! Exposes all modules so integration tests can import them.

pub mod api;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod server;
