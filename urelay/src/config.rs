//! Relay configuration resolved once at startup.
//!
//! [`RelayConfig`] is plain data: it deserializes from any `serde` format (the
//! `urelay` binary reads it from TOML) and turns into a [`RelayRegistry`] with
//! [`RelayConfig::registry`].
//!
//! # Example
//!
//! ```rust
//! use urelay::config::RelayConfig;
//!
//! let config: RelayConfig = serde_json::from_value(serde_json::json!({
//!     "ttl_seconds": 600,
//!     "chains": {
//!         "eip155:137": { "relay_address": "0x1111111111111111111111111111111111111111" }
//!     }
//! }))
//! .unwrap();
//! let registry = config.registry().unwrap();
//! assert!(registry.supports(137));
//! ```

use std::collections::HashMap;
use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::chain::{ChainId, ChainProfile, RelayRegistry, parse_caip2};
use crate::networks::default_payment_token;

/// Default validity window of a relay request, in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Default number of block confirmations awaited for each transaction.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Default receipt timeout, in seconds.
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;

/// Default environment variable holding the operator key.
pub const DEFAULT_OPERATOR_KEY_ENV: &str = "OPERATOR_PRIVATE_KEY";

/// How the operator signs the typed-data digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatorDigestEncoding {
    /// EIP-191 personal message over the 32 digest bytes
    /// (`"\x19Ethereum Signed Message:\n32" || digest`).
    #[default]
    PersonalMessage,
    /// Plain secp256k1 signature over the digest itself.
    Raw,
}

/// Relay deployment entry for one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Relay contract address.
    pub relay_address: Address,
    /// Payment token; defaults to the known USDC deployment for the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<Address>,
}

/// Top-level relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Seconds a request stays valid after it is built.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Confirmations awaited for approval and relay transactions.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,

    /// How long to wait for a transaction receipt.
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    /// Operator digest signing convention.
    #[serde(default)]
    pub operator_digest: OperatorDigestEncoding,

    /// Environment variable read for the operator key at signing time.
    #[serde(default = "default_operator_key_env")]
    pub operator_key_env: String,

    /// Relay deployments keyed by CAIP-2 network identifier.
    #[serde(default)]
    pub chains: HashMap<String, ChainEntry>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            confirmations: DEFAULT_CONFIRMATIONS,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            operator_digest: OperatorDigestEncoding::default(),
            operator_key_env: DEFAULT_OPERATOR_KEY_ENV.to_owned(),
            chains: HashMap::new(),
        }
    }
}

const fn default_ttl_seconds() -> u64 {
    DEFAULT_TTL_SECONDS
}

const fn default_confirmations() -> u64 {
    DEFAULT_CONFIRMATIONS
}

const fn default_receipt_timeout_secs() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT_SECS
}

fn default_operator_key_env() -> String {
    DEFAULT_OPERATOR_KEY_ENV.to_owned()
}

/// Errors from turning configuration into a registry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A chain key is not a valid `eip155:<id>` identifier.
    #[error("invalid CAIP-2 network identifier: {0}")]
    InvalidNetwork(String),
    /// No payment token configured and none known for the chain.
    #[error("no payment token configured for chain {0} and no default is known")]
    MissingPaymentToken(ChainId),
    /// An address field is the zero address.
    #[error("{field} for chain {chain_id} is the zero address")]
    ZeroAddress {
        /// Chain of the offending entry.
        chain_id: ChainId,
        /// Field name.
        field: &'static str,
    },
    /// The same chain appears twice.
    #[error("chain {0} is configured more than once")]
    DuplicateChain(ChainId),
    /// The request TTL is zero.
    #[error("ttl_seconds must be greater than zero")]
    ZeroTtl,
}

impl RelayConfig {
    /// Resolves the configured chains into a [`RelayRegistry`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed network keys, missing payment
    /// tokens, zero addresses, duplicate chains, or a zero TTL.
    pub fn registry(&self) -> Result<RelayRegistry, ConfigError> {
        if self.ttl_seconds == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        let profiles = self
            .chains
            .iter()
            .map(|(network, entry)| {
                let chain_id = parse_caip2(network)
                    .ok_or_else(|| ConfigError::InvalidNetwork(network.clone()))?;
                let payment_token_address = entry
                    .payment_token
                    .or_else(|| default_payment_token(chain_id))
                    .ok_or(ConfigError::MissingPaymentToken(chain_id))?;
                Ok(ChainProfile {
                    chain_id,
                    relay_address: entry.relay_address,
                    payment_token_address,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        RelayRegistry::try_from_profiles(profiles)
    }

    /// Receipt timeout as a [`Duration`].
    #[must_use]
    pub const fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::USDC_POLYGON;
    use alloy_primitives::address;

    const RELAY: Address = address!("1111111111111111111111111111111111111111");

    fn config_with(network: &str, payment_token: Option<Address>) -> RelayConfig {
        let mut config = RelayConfig::default();
        config.chains.insert(
            network.to_owned(),
            ChainEntry {
                relay_address: RELAY,
                payment_token,
            },
        );
        config
    }

    #[test]
    fn test_defaults() {
        let config: RelayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.ttl_seconds, 3600);
        assert_eq!(
            config.operator_digest,
            OperatorDigestEncoding::PersonalMessage
        );
    }

    #[test]
    fn test_operator_digest_names() {
        let raw: OperatorDigestEncoding = serde_json::from_str("\"raw\"").unwrap();
        assert_eq!(raw, OperatorDigestEncoding::Raw);
        let personal: OperatorDigestEncoding =
            serde_json::from_str("\"personal-message\"").unwrap();
        assert_eq!(personal, OperatorDigestEncoding::PersonalMessage);
    }

    #[test]
    fn test_payment_token_defaults_to_known_usdc() {
        let registry = config_with("eip155:137", None).registry().unwrap();
        let profile = registry.resolve(137).unwrap();
        assert_eq!(profile.payment_token_address, USDC_POLYGON);
        assert_eq!(profile.relay_address, RELAY);
    }

    #[test]
    fn test_explicit_payment_token_wins() {
        let token = address!("3333333333333333333333333333333333333333");
        let registry = config_with("eip155:137", Some(token)).registry().unwrap();
        assert_eq!(registry.resolve(137).unwrap().payment_token_address, token);
    }

    #[test]
    fn test_unknown_chain_needs_payment_token() {
        let err = config_with("eip155:31337", None).registry().unwrap_err();
        assert!(matches!(err, ConfigError::MissingPaymentToken(31337)));
    }

    #[test]
    fn test_invalid_network_key() {
        let err = config_with("polygon", None).registry().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNetwork(_)));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = config_with("eip155:137", None);
        config.ttl_seconds = 0;
        assert!(matches!(config.registry(), Err(ConfigError::ZeroTtl)));
    }
}
