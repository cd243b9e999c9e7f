//! Relay request construction, EIP-712 domain and digest.
//!
//! [`build_relay_request`] is pure: given the purchase parameters, the nonce
//! read from the relay contract and the current time, it returns the
//! [`RelayRequest`] both parties will sign. [`relay_domain`] binds signatures
//! to one relay deployment on one chain, and [`relay_digest`] is the 32-byte
//! typed-data hash the operator signs.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain};
use urelay::chain::ChainProfile;
use urelay::error::RelayError;
use urelay::timestamp::UnixTimestamp;

use crate::contract::RelayRequest;

/// EIP-712 domain name of every relay deployment.
pub const RELAY_DOMAIN_NAME: &str = "UniversalRelay";

/// EIP-712 domain version of every relay deployment.
pub const RELAY_DOMAIN_VERSION: &str = "1";

/// Values of a relay request that come from the caller rather than the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayRequestParams {
    /// The paying user; must be the address of the structured signer.
    pub user: Address,
    /// Contract receiving the purchase.
    pub target_contract: Address,
    /// Token being purchased.
    pub target_token: Address,
    /// Stable-coin used to pay.
    pub payment_token: Address,
    /// Payment amount in the payment token's smallest unit.
    pub amount: U256,
}

/// Builds a relay request expiring `ttl_seconds` after `now`.
///
/// # Errors
///
/// Returns [`RelayError::InvalidAmount`] when `amount` is zero.
pub fn build_relay_request(
    params: &RelayRequestParams,
    nonce: U256,
    ttl_seconds: u64,
    now: UnixTimestamp,
) -> Result<RelayRequest, RelayError> {
    if params.amount.is_zero() {
        return Err(RelayError::InvalidAmount);
    }
    Ok(RelayRequest {
        user: params.user,
        targetContract: params.target_contract,
        targetToken: params.target_token,
        paymentToken: params.payment_token,
        amount: params.amount,
        nonce,
        deadline: now.deadline_after(ttl_seconds).into(),
    })
}

/// EIP-712 domain of the relay deployed in `profile`.
#[must_use]
pub fn relay_domain(profile: &ChainProfile) -> Eip712Domain {
    eip712_domain! {
        name: RELAY_DOMAIN_NAME,
        version: RELAY_DOMAIN_VERSION,
        chain_id: profile.chain_id,
        verifying_contract: profile.relay_address,
    }
}

/// Typed-data digest `keccak256(0x1901 || domainSeparator || hashStruct(request))`.
#[must_use]
pub fn relay_digest(domain: &Eip712Domain, request: &RelayRequest) -> B256 {
    request.eip712_signing_hash(domain)
}

impl RelayRequest {
    /// The request deadline.
    #[must_use]
    pub fn deadline_timestamp(&self) -> UnixTimestamp {
        UnixTimestamp::from_u256_saturating(self.deadline)
    }
}
