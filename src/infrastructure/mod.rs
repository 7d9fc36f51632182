//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Configuration loading (config)
//! - Secret lookup and caching (secrets)
//! - Application state (state)
//! - HTTP server setup (server)

pub mod config;
pub mod secrets;
pub mod server;
pub mod state;

pub use config::{Config, ConfigError};
pub use state::AppState;
