//! Payment-token allowance toward the relay contract.

use alloy_primitives::{Address, TxHash, U256};
#[cfg(feature = "telemetry")]
use tracing::instrument;
use urelay::error::RelayError;

use crate::network::RelayNetwork;

/// What [`ensure_allowance`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceOutcome {
    /// The existing allowance already covered the amount. No transaction sent.
    Sufficient(U256),
    /// An unlimited approval was confirmed in this transaction.
    Approved(TxHash),
}

impl AllowanceOutcome {
    /// Hash of the approval transaction, if one was sent.
    #[must_use]
    pub const fn approval(&self) -> Option<TxHash> {
        match self {
            Self::Sufficient(_) => None,
            Self::Approved(tx_hash) => Some(*tx_hash),
        }
    }
}

/// Makes sure `spender` may pull at least `required` of `token` from `owner`.
///
/// Reads the current allowance and, only when it falls short, approves
/// `U256::MAX` and waits for the approval to be confirmed. The unlimited
/// approval lets later purchases skip this step entirely.
///
/// # Errors
///
/// - [`RelayError::Rpc`] if the allowance cannot be read
/// - [`RelayError::ApprovalFailed`] if the approval is not confirmed
#[cfg_attr(feature = "telemetry", instrument(skip(network), err))]
pub async fn ensure_allowance<N: RelayNetwork>(
    network: &N,
    token: Address,
    owner: Address,
    spender: Address,
    required: U256,
) -> Result<AllowanceOutcome, RelayError> {
    let current = network.allowance(token, owner, spender).await?;
    if current >= required {
        return Ok(AllowanceOutcome::Sufficient(current));
    }

    #[cfg(feature = "telemetry")]
    tracing::info!(%current, %required, "allowance too low, approving relay");

    let tx_hash = network.approve(token, owner, spender, U256::MAX).await?;
    Ok(AllowanceOutcome::Approved(tx_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockRelayNetwork, POLYGON, RELAY};
    use urelay::networks::USDC_POLYGON;

    const USER: Address = Address::repeat_byte(0xAA);

    #[tokio::test]
    async fn test_sufficient_allowance_sends_nothing() {
        let network = MockRelayNetwork::new(POLYGON).with_allowance(U256::from(100_000_000u64));

        let outcome = ensure_allowance(&network, USDC_POLYGON, USER, RELAY, U256::from(50_000_000u64))
            .await
            .unwrap();

        assert_eq!(outcome, AllowanceOutcome::Sufficient(U256::from(100_000_000u64)));
        assert_eq!(outcome.approval(), None);
        let state = network.state();
        assert!(state.approvals.is_empty());
        assert_eq!(state.calls, ["allowance"]);
    }

    #[tokio::test]
    async fn test_exact_allowance_is_sufficient() {
        let network = MockRelayNetwork::new(POLYGON).with_allowance(U256::from(50_000_000u64));
        let outcome = ensure_allowance(&network, USDC_POLYGON, USER, RELAY, U256::from(50_000_000u64))
            .await
            .unwrap();
        assert!(matches!(outcome, AllowanceOutcome::Sufficient(_)));
    }

    #[tokio::test]
    async fn test_short_allowance_approves_unlimited_once() {
        let network = MockRelayNetwork::new(POLYGON).with_allowance(U256::from(10u64));

        let outcome = ensure_allowance(&network, USDC_POLYGON, USER, RELAY, U256::from(50_000_000u64))
            .await
            .unwrap();

        assert!(outcome.approval().is_some());
        let state = network.state();
        assert_eq!(state.approvals, [(USDC_POLYGON, RELAY, U256::MAX)]);
        assert_eq!(state.calls, ["allowance", "approve"]);
    }

    #[tokio::test]
    async fn test_failed_approval_surfaces() {
        let network = MockRelayNetwork::new(POLYGON);
        network.state().fail_approval = true;

        let err = ensure_allowance(&network, USDC_POLYGON, USER, RELAY, U256::from(1u64))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ApprovalFailed(_)));
    }
}
