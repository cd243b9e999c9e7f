//! Error types for the command-line client.

use std::path::PathBuf;

use urelay::chain::ChainId;
use urelay::config::ConfigError;
use urelay::error::{PurchaseError, RelayError};

/// Errors that can occur in the command-line client.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected schema.
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configured chains are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A network argument or chain key is not `eip155:<id>`.
    #[error("invalid CAIP-2 network identifier: {0}")]
    InvalidNetwork(String),

    /// No RPC endpoint is configured for the chain.
    #[error("no rpc_url configured for chain {0}")]
    MissingRpcUrl(ChainId),

    /// The RPC endpoint serves a different chain than the one requested.
    #[error("rpc_url for chain {requested} is connected to chain {connected}")]
    ChainMismatch {
        /// Chain named on the command line.
        requested: ChainId,
        /// Chain reported by the endpoint.
        connected: ChainId,
    },

    /// The user private key could not be parsed.
    #[error("invalid user private key")]
    InvalidUserKey,

    /// A relay step failed outside a purchase.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// A purchase failed.
    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}
