//! Client configuration.
//!
//! Loads a TOML file and expands `$VAR` / `${VAR}` references from the
//! process environment before parsing. The relay settings are read into
//! [`RelayConfig`]; the binary additionally reads an `rpc_url` per chain.
//!
//! # Example Configuration
//!
//! ```toml
//! ttl_seconds = 3600
//! confirmations = 1
//! operator_digest = "personal-message"
//! operator_key_env = "OPERATOR_PRIVATE_KEY"
//!
//! [chains."eip155:137"]
//! relay_address = "0x1111111111111111111111111111111111111111"
//! rpc_url = "$POLYGON_RPC_URL"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to the configuration file (default: `urelay.toml`)
//! - Any variable referenced by `$VAR` in the file

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use url::Url;
use urelay::chain::{ChainId, parse_caip2};
use urelay::config::RelayConfig;

use crate::error::CliError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "urelay.toml";

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("valid env var pattern")
});

/// Relay configuration plus per-chain RPC endpoints.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Relay settings shared with the library.
    pub relay: RelayConfig,
    /// RPC endpoint per chain ID.
    pub rpc_urls: HashMap<ChainId, Url>,
}

#[derive(Debug, Default, Deserialize)]
struct RpcFile {
    #[serde(default)]
    chains: HashMap<String, RpcEntry>,
}

#[derive(Debug, Deserialize)]
struct RpcEntry {
    rpc_url: Option<Url>,
}

impl CliConfig {
    /// Loads the file at `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            String::new()
        };
        Self::from_toml_str(&expand_env_vars(&content, |name| std::env::var(name).ok()))
    }

    /// Parses configuration from TOML text. No environment expansion.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] for malformed TOML or network keys.
    pub fn from_toml_str(content: &str) -> Result<Self, CliError> {
        let relay: RelayConfig = toml::from_str(content)?;
        let rpc: RpcFile = toml::from_str(content)?;
        let mut rpc_urls = HashMap::new();
        for (network, entry) in rpc.chains {
            let chain_id =
                parse_caip2(&network).ok_or_else(|| CliError::InvalidNetwork(network.clone()))?;
            if let Some(url) = entry.rpc_url {
                rpc_urls.insert(chain_id, url);
            }
        }
        Ok(Self { relay, rpc_urls })
    }

    /// RPC endpoint for `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::MissingRpcUrl`] if none is configured.
    pub fn rpc_url(&self, chain_id: ChainId) -> Result<&Url, CliError> {
        self.rpc_urls
            .get(&chain_id)
            .ok_or(CliError::MissingRpcUrl(chain_id))
    }
}

/// Replaces `$VAR` and `${VAR}` with `lookup(VAR)`.
///
/// Unresolved variables are left as-is.
pub fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    ENV_VAR
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            lookup(name).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}
