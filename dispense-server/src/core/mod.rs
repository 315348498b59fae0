//! Core - configuration, server state, startup
//!
//! - [`Config`] - environment configuration
//! - [`ServerState`] - shared handles for HTTP handlers
//! - [`Server`] - HTTP listener
//! - [`ServerError`] - startup errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
