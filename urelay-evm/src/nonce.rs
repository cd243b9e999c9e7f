//! Relay nonce lookup and per-user purchase serialization.
//!
//! The relay contract holds one replay-protection counter per user and
//! consumes it on successful execution. Two purchases for the same user that
//! overlap between nonce read and submission would sign the same nonce, and
//! one of them would revert. [`PurchaseLocks`] serializes purchases per user
//! so that each one reads the nonce its predecessor left behind.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
#[cfg(feature = "telemetry")]
use tracing::instrument;
use urelay::error::RelayError;

use crate::network::RelayNetwork;

/// Reads `relay.nonces(user)`. The value is fetched fresh and never cached.
///
/// # Errors
///
/// Returns [`RelayError::Rpc`] if the read fails.
#[cfg_attr(feature = "telemetry", instrument(skip(network), err))]
pub async fn fetch_nonce<N: RelayNetwork>(
    network: &N,
    relay: Address,
    user: Address,
) -> Result<U256, RelayError> {
    network.relay_nonce(relay, user).await
}

/// One async mutex per user address.
///
/// Cloning shares the underlying table.
#[derive(Clone, Debug, Default)]
pub struct PurchaseLocks {
    users: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl PurchaseLocks {
    /// Empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other purchase for `user` is in flight.
    ///
    /// The purchase holds the returned guard until it finishes.
    pub async fn lock(&self, user: Address) -> OwnedMutexGuard<()> {
        let slot = {
            let entry = self
                .users
                .entry(user)
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };
        slot.lock_owned().await
    }
}
