//! On-chain collaborators of a relay purchase.
//!
//! [`RelayNetwork`] is everything the pipeline needs from the connected chain:
//! its chain ID, the payment token's allowance and approval, and the relay
//! contract's nonce and execution entry point. Write operations return only
//! after the transaction is confirmed.
//!
//! [`Eip155RelayNetwork`] implements it over an alloy [`Provider`] whose wallet
//! is the user's.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy_contract::Error as ContractError;
use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::{PendingTransactionBuilder, Provider};
use alloy_sol_types::decode_revert_reason;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use urelay::chain::ChainId;
use urelay::config::{DEFAULT_CONFIRMATIONS, DEFAULT_RECEIPT_TIMEOUT_SECS};
use urelay::error::RelayError;

use crate::contract::{IERC20, IUniversalRelay, RelayRequest};

/// Awaits a future, optionally instrumenting it with a tracing span.
macro_rules! traced {
    ($fut:expr, $span:expr) => {{
        #[cfg(feature = "telemetry")]
        {
            use tracing::Instrument;
            $fut.instrument($span).await
        }
        #[cfg(not(feature = "telemetry"))]
        {
            $fut.await
        }
    }};
}

/// Chain-side operations used by a relay purchase.
pub trait RelayNetwork: Send + Sync {
    /// Chain ID of the connected network.
    fn chain_id(&self) -> impl Future<Output = Result<ChainId, RelayError>> + Send;

    /// `token.allowance(owner, spender)`.
    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, RelayError>> + Send;

    /// Sends `token.approve(spender, amount)` from `owner` and waits for
    /// confirmation.
    ///
    /// Fails with [`RelayError::ApprovalFailed`] on any send, confirmation
    /// or revert failure, and when the token returns `false`.
    fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = Result<TxHash, RelayError>> + Send;

    /// `relay.nonces(user)`.
    fn relay_nonce(
        &self,
        relay: Address,
        user: Address,
    ) -> impl Future<Output = Result<U256, RelayError>> + Send;

    /// Sends `relay.executeRelay(request, userSignature, operatorSignature)`
    /// and waits for confirmation.
    ///
    /// Fails with [`RelayError::RelayExecution`] when the contract reverts and
    /// [`RelayError::Submission`] when the transport fails.
    fn execute_relay(
        &self,
        relay: Address,
        request: &RelayRequest,
        user_signature: Bytes,
        operator_signature: Bytes,
    ) -> impl Future<Output = Result<TxHash, RelayError>> + Send;
}

impl<N: RelayNetwork> RelayNetwork for Arc<N> {
    fn chain_id(&self) -> impl Future<Output = Result<ChainId, RelayError>> + Send {
        (**self).chain_id()
    }

    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, RelayError>> + Send {
        (**self).allowance(token, owner, spender)
    }

    fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = Result<TxHash, RelayError>> + Send {
        (**self).approve(token, owner, spender, amount)
    }

    fn relay_nonce(
        &self,
        relay: Address,
        user: Address,
    ) -> impl Future<Output = Result<U256, RelayError>> + Send {
        (**self).relay_nonce(relay, user)
    }

    fn execute_relay(
        &self,
        relay: Address,
        request: &RelayRequest,
        user_signature: Bytes,
        operator_signature: Bytes,
    ) -> impl Future<Output = Result<TxHash, RelayError>> + Send {
        (**self).execute_relay(relay, request, user_signature, operator_signature)
    }
}

/// [`RelayNetwork`] over an alloy provider.
///
/// The provider must carry the user's wallet: approvals and relay submissions
/// are sent from the provider's default signer.
#[derive(Debug, Clone)]
pub struct Eip155RelayNetwork<P> {
    provider: P,
    confirmations: u64,
    receipt_timeout: Duration,
}

impl<P> Eip155RelayNetwork<P> {
    /// Wraps `provider` with one confirmation and the default receipt timeout.
    pub const fn new(provider: P) -> Self {
        Self {
            provider,
            confirmations: DEFAULT_CONFIRMATIONS,
            receipt_timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
        }
    }

    /// Sets the number of confirmations awaited per transaction.
    #[must_use]
    pub const fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Sets how long to wait for a receipt.
    #[must_use]
    pub const fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// The wrapped provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider + Send + Sync> Eip155RelayNetwork<P> {
    /// Waits for `pending` to be mined, returning its hash and status.
    async fn confirm(
        &self,
        pending: PendingTransactionBuilder<alloy_network::Ethereum>,
    ) -> Result<(TxHash, bool), alloy_provider::PendingTransactionError> {
        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await?;
        Ok((receipt.transaction_hash(), receipt.status()))
    }
}

impl<P: Provider + Send + Sync> RelayNetwork for Eip155RelayNetwork<P> {
    async fn chain_id(&self) -> Result<ChainId, RelayError> {
        let fut = self.provider.get_chain_id();
        traced!(
            fut,
            tracing::info_span!("get_chain_id", otel.kind = "client")
        )
        .map_err(|e| RelayError::Rpc(e.to_string()))
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, RelayError> {
        let erc20 = IERC20::new(token, &self.provider);
        let call = erc20.allowance(owner, spender);
        call.call()
            .await
            .map_err(|e| RelayError::Rpc(e.to_string()))
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    async fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, RelayError> {
        let erc20 = IERC20::new(token, &self.provider);
        let call = erc20.approve(spender, amount).from(owner);
        // Only a simulation exposes the returned bool.
        let accepted = call
            .call()
            .await
            .map_err(|e| RelayError::ApprovalFailed(e.to_string()))?;
        if !accepted {
            return Err(RelayError::ApprovalFailed(format!(
                "token {token} returned false from approve"
            )));
        }
        let pending = call
            .send()
            .await
            .map_err(|e| RelayError::ApprovalFailed(e.to_string()))?;
        let (tx_hash, success) = self
            .confirm(pending)
            .await
            .map_err(|e| RelayError::ApprovalFailed(e.to_string()))?;
        if success {
            Ok(tx_hash)
        } else {
            Err(RelayError::ApprovalFailed(format!(
                "transaction {tx_hash} reverted"
            )))
        }
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    async fn relay_nonce(&self, relay: Address, user: Address) -> Result<U256, RelayError> {
        let contract = IUniversalRelay::new(relay, &self.provider);
        let call = contract.nonces(user);
        call.call()
            .await
            .map_err(|e| RelayError::Rpc(e.to_string()))
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        relay = %relay,
        user = %request.user,
        nonce = %request.nonce,
    )))]
    async fn execute_relay(
        &self,
        relay: Address,
        request: &RelayRequest,
        user_signature: Bytes,
        operator_signature: Bytes,
    ) -> Result<TxHash, RelayError> {
        let contract = IUniversalRelay::new(relay, &self.provider);
        let call = contract.executeRelay(request.clone(), user_signature, operator_signature);
        let pending = call.send().await.map_err(classify_send_error)?;
        let (tx_hash, success) = self
            .confirm(pending)
            .await
            .map_err(|e| RelayError::Submission(e.to_string()))?;
        relay_outcome(tx_hash, success)
    }
}

/// Maps a mined relay transaction's status to its result.
fn relay_outcome(tx_hash: TxHash, success: bool) -> Result<TxHash, RelayError> {
    if success {
        Ok(tx_hash)
    } else {
        Err(RelayError::reverted(None, Some(tx_hash)))
    }
}

/// Maps a failed `send()` to a revert or a transport failure.
///
/// Sending estimates gas first, so a contract-level rejection shows up here as
/// a JSON-RPC error response rather than as a mined, failed transaction.
fn classify_send_error(error: ContractError) -> RelayError {
    match &error {
        ContractError::TransportError(transport) => match transport.as_error_resp() {
            Some(payload) => {
                let reason = payload
                    .as_revert_data()
                    .and_then(|data| decode_revert_reason(&data));
                let is_revert = reason.is_some() || payload.message.contains("revert");
                if is_revert {
                    RelayError::reverted(
                        Some(reason.unwrap_or_else(|| payload.message.to_string())),
                        None,
                    )
                } else {
                    RelayError::Submission(error.to_string())
                }
            }
            None => RelayError::Submission(error.to_string()),
        },
        _ => RelayError::Submission(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_rpc::ErrorPayload;
    use alloy_provider::ProviderBuilder;
    use alloy_sol_types::{Revert, SolError};
    use alloy_transport::RpcError;
    use alloy_transport::mock::Asserter;
    use urelay::error::RevertReason;

    fn error_payload(code: i64, message: &'static str, data: Option<Bytes>) -> ErrorPayload {
        ErrorPayload {
            code,
            message: message.into(),
            data: data.map(|data| serde_json::value::to_raw_value(&data).unwrap()),
        }
    }

    fn invalid_nonce_revert() -> ErrorPayload {
        let data = Bytes::from(Revert::from("Invalid nonce").abi_encode());
        error_payload(3, "execution reverted: Invalid nonce", Some(data))
    }

    fn relay_request() -> RelayRequest {
        RelayRequest {
            user: Address::repeat_byte(0xAA),
            targetContract: Address::repeat_byte(0xBB),
            targetToken: Address::repeat_byte(0xBB),
            paymentToken: Address::repeat_byte(0xDD),
            amount: U256::from(50_000_000u64),
            nonce: U256::ZERO,
            deadline: U256::from(u64::MAX),
        }
    }

    #[tokio::test]
    async fn test_chain_id_from_provider() {
        let asserter = Asserter::new();
        asserter.push_success(&alloy_primitives::U64::from(137));
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);
        let network = Eip155RelayNetwork::new(provider);
        assert_eq!(network.chain_id().await.unwrap(), 137);
    }

    #[tokio::test]
    async fn test_allowance_decodes_uint256() {
        let asserter = Asserter::new();
        let encoded = Bytes::from(U256::from(50_000_000u64).to_be_bytes::<32>().to_vec());
        asserter.push_success(&encoded);
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);
        let network = Eip155RelayNetwork::new(provider);

        let allowance = network
            .allowance(Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3))
            .await
            .unwrap();
        assert_eq!(allowance, U256::from(50_000_000u64));
    }

    #[tokio::test]
    async fn test_rpc_failure_maps_to_rpc_error() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("upstream unavailable");
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);
        let network = Eip155RelayNetwork::new(provider);

        let err = network
            .relay_nonce(Address::repeat_byte(1), Address::repeat_byte(2))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Rpc(_)));
    }

    #[test]
    fn test_non_transport_send_error_is_submission() {
        let err = classify_send_error(ContractError::NotADeploymentTransaction);
        assert!(matches!(err, RelayError::Submission(_)));
    }

    #[test]
    fn test_revert_data_is_decoded_and_classified() {
        let err = classify_send_error(ContractError::TransportError(RpcError::ErrorResp(
            invalid_nonce_revert(),
        )));
        let RelayError::RelayExecution {
            reason,
            message,
            tx_hash,
        } = err
        else {
            panic!("expected relay execution error");
        };
        assert_eq!(reason, RevertReason::StaleNonce);
        assert_eq!(message.as_deref(), Some("revert: Invalid nonce"));
        assert_eq!(tx_hash, None);
    }

    #[test]
    fn test_revert_without_data_uses_message() {
        let err = classify_send_error(ContractError::TransportError(RpcError::ErrorResp(
            error_payload(3, "execution reverted", None),
        )));
        let RelayError::RelayExecution { reason, message, .. } = err else {
            panic!("expected relay execution error");
        };
        assert_eq!(reason, RevertReason::Other);
        assert_eq!(message.as_deref(), Some("execution reverted"));
    }

    #[test]
    fn test_non_revert_error_response_is_submission() {
        let err = classify_send_error(ContractError::TransportError(RpcError::ErrorResp(
            error_payload(-32000, "insufficient funds for gas * price + value", None),
        )));
        assert!(matches!(err, RelayError::Submission(_)));
    }

    #[tokio::test]
    async fn test_execute_relay_rejected_at_send_is_classified() {
        let asserter = Asserter::new();
        asserter.push_failure(invalid_nonce_revert());
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter);
        let network = Eip155RelayNetwork::new(provider);

        let err = network
            .execute_relay(Address::repeat_byte(0xCC), &relay_request(), Bytes::new(), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::RelayExecution {
                reason: RevertReason::StaleNonce,
                tx_hash: None,
                ..
            }
        ));
    }

    #[test]
    fn test_failed_receipt_status_is_revert_with_hash() {
        let tx_hash = TxHash::repeat_byte(0x11);
        assert_eq!(relay_outcome(tx_hash, true).unwrap(), tx_hash);

        let err = relay_outcome(tx_hash, false).unwrap_err();
        assert!(matches!(
            err,
            RelayError::RelayExecution {
                reason: RevertReason::Other,
                message: None,
                tx_hash: Some(hash),
            } if hash == tx_hash
        ));
    }

    #[tokio::test]
    async fn test_approve_rejected_when_token_returns_false() {
        let asserter = Asserter::new();
        asserter.push_success(&Bytes::from(vec![0u8; 32]));
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);
        let network = Eip155RelayNetwork::new(provider);

        let err = network
            .approve(
                Address::repeat_byte(0xDD),
                Address::repeat_byte(0xAA),
                Address::repeat_byte(0xCC),
                U256::MAX,
            )
            .await
            .unwrap_err();
        let RelayError::ApprovalFailed(message) = err else {
            panic!("expected approval failure");
        };
        assert!(message.contains("returned false"), "{message}");
    }

    #[test]
    fn test_revert_reason_classification_from_message() {
        let err = RelayError::reverted(Some("execution reverted: invalid nonce".into()), None);
        assert!(matches!(
            err,
            RelayError::RelayExecution {
                reason: RevertReason::StaleNonce,
                ..
            }
        ));
    }
}
