//! RPC endpoint checks.

use urelay::chain::ChainId;
use urelay_evm::RelayNetwork;

use crate::error::CliError;

/// Fails unless `network` is connected to the `requested` chain.
///
/// # Errors
///
/// - [`CliError::Relay`] if the chain ID cannot be read
/// - [`CliError::ChainMismatch`] if the endpoint serves another chain
pub async fn ensure_chain<N: RelayNetwork>(
    network: &N,
    requested: ChainId,
) -> Result<(), CliError> {
    let connected = network.chain_id().await?;
    if connected == requested {
        Ok(())
    } else {
        Err(CliError::ChainMismatch {
            requested,
            connected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U64;
    use alloy_provider::ProviderBuilder;
    use alloy_transport::mock::Asserter;
    use urelay_evm::Eip155RelayNetwork;

    fn network_on(chain_id: u64) -> Eip155RelayNetwork<impl alloy_provider::Provider> {
        let asserter = Asserter::new();
        asserter.push_success(&U64::from(chain_id));
        Eip155RelayNetwork::new(ProviderBuilder::new().connect_mocked_client(asserter))
    }

    #[tokio::test]
    async fn test_matching_chain_passes() {
        ensure_chain(&network_on(137), 137).await.unwrap();
    }

    #[tokio::test]
    async fn test_endpoint_on_other_chain_is_rejected() {
        let err = ensure_chain(&network_on(8453), 137).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::ChainMismatch {
                requested: 137,
                connected: 8453,
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_relay_error() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("connection refused");
        let network = Eip155RelayNetwork::new(ProviderBuilder::new().connect_mocked_client(asserter));
        let err = ensure_chain(&network, 137).await.unwrap_err();
        assert!(matches!(err, CliError::Relay(_)));
    }
}
