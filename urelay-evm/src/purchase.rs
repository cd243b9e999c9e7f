//! Gasless purchase orchestration.
//!
//! A purchase runs six steps in order and stops at the first failure:
//!
//! 1. read the active chain and resolve its [`ChainProfile`]
//! 2. raise the payment-token allowance toward the relay if it is short
//! 3. read the user's relay nonce
//! 4. build the [`RelayRequest`]
//! 5. collect the user and operator signatures
//! 6. submit and wait for confirmation
//!
//! Failures come back as a [`PurchaseError`] naming the step. Nothing is
//! retried internally; the caller decides using [`PurchaseError::retry_hint`].
//! Steps 2 to 6 hold a per-user lock so that concurrent purchases for the
//! same user never sign the same nonce.

use alloy_primitives::{Address, B256, TxHash, U256};
#[cfg(feature = "telemetry")]
use tracing::instrument;
use urelay::chain::{ChainId, ChainProfile, RelayRegistry};
use urelay::config::{ConfigError, DEFAULT_TTL_SECONDS, RelayConfig};
use urelay::error::{PurchaseError, PurchaseStep, RelayError};
use urelay::timestamp::UnixTimestamp;

use crate::allowance::ensure_allowance;
use crate::authorize::authorize;
use crate::contract::RelayRequest;
use crate::network::RelayNetwork;
use crate::nonce::{PurchaseLocks, fetch_nonce};
use crate::request::{RelayRequestParams, build_relay_request, relay_domain};
use crate::signer::{DigestSigner, StructuredSigner};
use crate::submit::submit_relay;

/// What to buy and how much to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseOrder {
    /// Contract receiving the purchase.
    pub target_contract: Address,
    /// Token being purchased.
    pub target_token: Address,
    /// Payment amount in the payment token's smallest unit.
    pub amount: U256,
}

impl PurchaseOrder {
    /// Order where the purchased token's own contract receives the purchase.
    #[must_use]
    pub const fn new(target_token: Address, amount: U256) -> Self {
        Self {
            target_contract: target_token,
            target_token,
            amount,
        }
    }

    /// Sends the purchase to a contract other than the token itself.
    #[must_use]
    pub const fn with_target_contract(mut self, target_contract: Address) -> Self {
        self.target_contract = target_contract;
        self
    }
}

/// Outcome of a confirmed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Hash of the confirmed relay transaction.
    pub tx_hash: TxHash,
    /// Chain the purchase ran on.
    pub chain_id: ChainId,
    /// The request as signed and executed.
    pub request: RelayRequest,
    /// Approval sent during this purchase, if the allowance was short.
    pub approval: Option<TxHash>,
    /// Typed-data digest both parties signed.
    pub digest: B256,
}

/// Runs gasless purchases for one user over one network connection.
#[derive(Debug, Clone)]
pub struct GaslessPurchase<N, U> {
    network: N,
    user: U,
    registry: RelayRegistry,
    ttl_seconds: u64,
    locks: PurchaseLocks,
}

impl<N, U> GaslessPurchase<N, U>
where
    N: RelayNetwork,
    U: StructuredSigner,
{
    /// Purchases for `user` over `network`, with relays from `registry` and
    /// the default one-hour request lifetime.
    pub fn new(network: N, user: U, registry: RelayRegistry) -> Self {
        Self {
            network,
            user,
            registry,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            locks: PurchaseLocks::new(),
        }
    }

    /// Builds the registry and request lifetime from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configured chains are invalid.
    pub fn from_config(network: N, user: U, config: &RelayConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(network, user, config.registry()?).with_ttl(config.ttl_seconds))
    }

    /// Sets how long a signed request stays valid.
    #[must_use]
    pub const fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Shares a lock table with other purchasers, so purchases for the same
    /// user are serialized across all of them.
    #[must_use]
    pub fn with_locks(mut self, locks: PurchaseLocks) -> Self {
        self.locks = locks;
        self
    }

    /// The supported chains.
    pub const fn registry(&self) -> &RelayRegistry {
        &self.registry
    }

    /// The network connection.
    pub const fn network(&self) -> &N {
        &self.network
    }

    /// Reads the active chain and resolves its relay profile.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Rpc`] if the chain cannot be read and
    /// [`RelayError::UnsupportedChain`] if no relay is registered for it.
    pub async fn chain_profile(&self) -> Result<ChainProfile, PurchaseError> {
        let chain_id = self
            .network
            .chain_id()
            .await
            .map_err(|e| PurchaseError::new(PurchaseStep::ResolveChain, None, e))?;
        self.registry
            .resolve(chain_id)
            .copied()
            .map_err(|e| PurchaseError::new(PurchaseStep::ResolveChain, Some(chain_id), e))
    }

    /// Runs a full purchase and returns its receipt.
    ///
    /// # Errors
    ///
    /// Returns a [`PurchaseError`] naming the step that failed. No step after
    /// the failing one runs.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        user = %self.user.address(),
        target_token = %order.target_token,
        amount = %order.amount,
    )))]
    pub async fn purchase<O: DigestSigner>(
        &self,
        operator: &O,
        order: PurchaseOrder,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let profile = self.chain_profile().await?;
        let chain_id = profile.chain_id;
        let fail = |step: PurchaseStep| move |e: RelayError| PurchaseError::new(step, Some(chain_id), e);

        let user = self.user.address();
        let _guard = self.locks.lock(user).await;

        let allowance = ensure_allowance(
            &self.network,
            profile.payment_token_address,
            user,
            profile.relay_address,
            order.amount,
        )
        .await
        .map_err(fail(PurchaseStep::Allowance))?;

        let nonce = fetch_nonce(&self.network, profile.relay_address, user)
            .await
            .map_err(fail(PurchaseStep::Nonce))?;

        let params = RelayRequestParams {
            user,
            target_contract: order.target_contract,
            target_token: order.target_token,
            payment_token: profile.payment_token_address,
            amount: order.amount,
        };
        let request = build_relay_request(&params, nonce, self.ttl_seconds, UnixTimestamp::now())
            .map_err(fail(PurchaseStep::Build))?;

        let domain = relay_domain(&profile);
        let bundle = authorize(&domain, &request, &self.user, operator)
            .await
            .map_err(fail(PurchaseStep::Authorize))?;

        let tx_hash = submit_relay(
            &self.network,
            profile.relay_address,
            &request,
            &bundle,
            UnixTimestamp::now(),
        )
        .await
        .map_err(fail(PurchaseStep::Submit))?;

        #[cfg(feature = "telemetry")]
        tracing::info!(%tx_hash, chain_id, nonce = %request.nonce, "purchase confirmed");

        Ok(PurchaseReceipt {
            tx_hash,
            chain_id,
            request,
            approval: allowance.approval(),
            digest: bundle.digest,
        })
    }

    /// Buys `target_token` for `amount` of the chain's payment token and
    /// returns the confirmed relay transaction hash.
    ///
    /// # Errors
    ///
    /// See [`purchase`](Self::purchase).
    pub async fn purchase_with_relay<O: DigestSigner>(
        &self,
        operator: &O,
        target_token: Address,
        amount: U256,
    ) -> Result<TxHash, PurchaseError> {
        let receipt = self
            .purchase(operator, PurchaseOrder::new(target_token, amount))
            .await?;
        Ok(receipt.tx_hash)
    }
}
