//! Chain identifiers and the relay registry.
//!
//! The registry maps each supported chain to a [`ChainProfile`]: the relay
//! contract deployed there and the token used to pay. It is built once at
//! startup from [`RelayConfig`](crate::config::RelayConfig) and injected into
//! whatever drives a purchase, so mainnet and testnet deployments swap through
//! configuration alone.

use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::error::RelayError;

/// An EIP-155 chain ID (e.g., 137 for Polygon).
pub type ChainId = u64;

/// Formats a chain ID as a CAIP-2 identifier.
///
/// Example: `caip2(137)` returns `"eip155:137"`.
#[must_use]
pub fn caip2(chain_id: ChainId) -> String {
    format!("eip155:{chain_id}")
}

/// Parses a CAIP-2 identifier into an EIP-155 chain ID.
///
/// Returns `None` if the input is not a valid `eip155:` prefixed string.
#[must_use]
pub fn parse_caip2(caip: &str) -> Option<ChainId> {
    caip.strip_prefix("eip155:").and_then(|s| s.parse().ok())
}

/// Relay deployment on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProfile {
    /// EIP-155 chain ID.
    pub chain_id: ChainId,
    /// Relay contract; also the EIP-712 `verifyingContract`.
    pub relay_address: Address,
    /// Stable-coin the user pays with.
    pub payment_token_address: Address,
}

/// Supported chains keyed by chain ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayRegistry {
    profiles: HashMap<ChainId, ChainProfile>,
}

impl RelayRegistry {
    /// Builds a registry, rejecting profiles with a zero address and chains
    /// listed twice.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroAddress`] or [`ConfigError::DuplicateChain`].
    pub fn try_from_profiles(
        profiles: impl IntoIterator<Item = ChainProfile>,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        for profile in profiles {
            if profile.relay_address.is_zero() {
                return Err(ConfigError::ZeroAddress {
                    chain_id: profile.chain_id,
                    field: "relay_address",
                });
            }
            if profile.payment_token_address.is_zero() {
                return Err(ConfigError::ZeroAddress {
                    chain_id: profile.chain_id,
                    field: "payment_token",
                });
            }
            if registry.profiles.insert(profile.chain_id, profile).is_some() {
                return Err(ConfigError::DuplicateChain(profile.chain_id));
            }
        }
        Ok(registry)
    }

    /// Returns the profile for `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnsupportedChain`] when no relay is registered
    /// for the chain.
    pub fn resolve(&self, chain_id: ChainId) -> Result<&ChainProfile, RelayError> {
        self.profiles
            .get(&chain_id)
            .ok_or(RelayError::UnsupportedChain(chain_id))
    }

    /// Whether a relay is registered for `chain_id`.
    #[must_use]
    pub fn supports(&self, chain_id: ChainId) -> bool {
        self.profiles.contains_key(&chain_id)
    }

    /// Registered chain IDs in ascending order.
    #[must_use]
    pub fn chain_ids(&self) -> Vec<ChainId> {
        let mut ids: Vec<_> = self.profiles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterates over registered profiles in no particular order.
    pub fn profiles(&self) -> impl Iterator<Item = &ChainProfile> {
        self.profiles.values()
    }

    /// Number of registered chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no chain is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn profile(chain_id: ChainId) -> ChainProfile {
        ChainProfile {
            chain_id,
            relay_address: address!("1111111111111111111111111111111111111111"),
            payment_token_address: address!("2222222222222222222222222222222222222222"),
        }
    }

    #[test]
    fn test_caip2_roundtrip() {
        assert_eq!(caip2(137), "eip155:137");
        assert_eq!(parse_caip2("eip155:137"), Some(137));
        assert_eq!(parse_caip2("solana:mainnet"), None);
        assert_eq!(parse_caip2("eip155:abc"), None);
    }

    #[test]
    fn test_resolve_registered_chain() {
        let registry = RelayRegistry::try_from_profiles([profile(137), profile(8453)]).unwrap();
        let resolved = registry.resolve(137).unwrap();
        assert_eq!(resolved.chain_id, 137);
        assert!(!resolved.relay_address.is_zero());
        assert!(!resolved.payment_token_address.is_zero());
        assert_eq!(registry.chain_ids(), vec![137, 8453]);
    }

    #[test]
    fn test_resolve_unregistered_chain() {
        let registry = RelayRegistry::try_from_profiles([profile(137)]).unwrap();
        let err = registry.resolve(1).unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedChain(1)));
        assert!(!registry.supports(1));
    }

    #[test]
    fn test_rejects_zero_relay() {
        let mut bad = profile(137);
        bad.relay_address = Address::ZERO;
        let err = RelayRegistry::try_from_profiles([bad]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ZeroAddress {
                chain_id: 137,
                field: "relay_address"
            }
        ));
    }

    #[test]
    fn test_rejects_duplicate_chain() {
        let err = RelayRegistry::try_from_profiles([profile(10), profile(10)]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateChain(10)));
    }
}
