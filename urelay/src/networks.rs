//! Known relay networks and their default payment tokens.
//!
//! Relay contracts are deployed per chain by the relay operator, so no relay
//! address has a default. The payment token does: each known network pays in
//! its canonical USDC deployment unless configuration overrides it.

use alloy_primitives::{Address, address};

use crate::chain::ChainId;

/// Optimism Mainnet chain ID.
pub const OPTIMISM_MAINNET: ChainId = 10;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: ChainId = 137;

/// Base Mainnet chain ID.
pub const BASE_MAINNET: ChainId = 8453;

/// Arbitrum One chain ID.
pub const ARBITRUM_ONE: ChainId = 42161;

/// Polygon Amoy (testnet) chain ID.
pub const POLYGON_AMOY: ChainId = 80002;

/// Bridged USDC (USDC.e) on Polygon Mainnet.
pub const USDC_POLYGON: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

/// Native USDC on Arbitrum One.
pub const USDC_ARBITRUM: Address = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");

/// Native USDC on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// Bridged USDC on Optimism.
pub const USDC_OPTIMISM: Address = address!("7F5c764cBc14f9669B88837ca1490cCa17c31607");

/// USDC on Polygon Amoy.
pub const USDC_POLYGON_AMOY: Address = address!("41E94Eb019C0762f9Bfcf9Fb1E58725BfB0e7582");

/// A network with a known default payment token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownNetwork {
    /// EIP-155 chain ID.
    pub chain_id: ChainId,
    /// Human-readable network name.
    pub name: &'static str,
    /// Default stable-coin used to pay for purchases.
    pub payment_token: Address,
}

const KNOWN_NETWORKS: [KnownNetwork; 5] = [
    KnownNetwork {
        chain_id: POLYGON_MAINNET,
        name: "polygon",
        payment_token: USDC_POLYGON,
    },
    KnownNetwork {
        chain_id: ARBITRUM_ONE,
        name: "arbitrum",
        payment_token: USDC_ARBITRUM,
    },
    KnownNetwork {
        chain_id: BASE_MAINNET,
        name: "base",
        payment_token: USDC_BASE,
    },
    KnownNetwork {
        chain_id: OPTIMISM_MAINNET,
        name: "optimism",
        payment_token: USDC_OPTIMISM,
    },
    KnownNetwork {
        chain_id: POLYGON_AMOY,
        name: "polygon-amoy",
        payment_token: USDC_POLYGON_AMOY,
    },
];

/// Returns every network with a known default payment token.
#[must_use]
pub const fn known_networks() -> &'static [KnownNetwork] {
    &KNOWN_NETWORKS
}

/// Looks up a known network by chain ID.
#[must_use]
pub fn known_network(chain_id: ChainId) -> Option<&'static KnownNetwork> {
    KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Default payment token for `chain_id`, if the network is known.
#[must_use]
pub fn default_payment_token(chain_id: ChainId) -> Option<Address> {
    known_network(chain_id).map(|n| n.payment_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_network_has_a_token() {
        for network in known_networks() {
            assert!(!network.payment_token.is_zero(), "{}", network.name);
            assert_eq!(
                default_payment_token(network.chain_id),
                Some(network.payment_token)
            );
        }
    }

    #[test]
    fn test_unknown_network() {
        assert_eq!(default_payment_token(1), None);
        assert!(known_network(31337).is_none());
    }
}
