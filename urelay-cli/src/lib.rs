//! Command-line client for gasless relay purchases.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with environment variable expansion
//! - [`connect`] - checks on the configured RPC endpoints
//! - [`error`] - client error types

pub mod config;
pub mod connect;
pub mod error;

pub use config::CliConfig;
pub use error::CliError;
