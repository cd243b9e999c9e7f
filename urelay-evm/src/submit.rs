//! Submission of a signed relay request.

use alloy_primitives::{Address, TxHash};
#[cfg(feature = "telemetry")]
use tracing::instrument;
use urelay::error::{RelayError, RevertReason};
use urelay::timestamp::UnixTimestamp;

use crate::authorize::SignatureBundle;
use crate::contract::RelayRequest;
use crate::network::RelayNetwork;

/// Submits `request` with its signatures to `relay` and waits for confirmation.
///
/// Two conditions the contract would reject are checked first, so that no
/// transaction is broadcast for them:
///
/// - the deadline is before `now`
/// - the user's on-chain nonce has moved past `request.nonce`
///
/// The on-chain check is authoritative; these only save a doomed transaction.
///
/// # Errors
///
/// - [`RelayError::Expired`] if the deadline has passed
/// - [`RelayError::RelayExecution`] if the nonce is stale or the contract reverts
/// - [`RelayError::Rpc`] if the nonce cannot be re-read
/// - [`RelayError::Submission`] if the transaction cannot be sent or confirmed
#[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
    relay = %relay,
    user = %request.user,
    nonce = %request.nonce,
)))]
pub async fn submit_relay<N: RelayNetwork>(
    network: &N,
    relay: Address,
    request: &RelayRequest,
    bundle: &SignatureBundle,
    now: UnixTimestamp,
) -> Result<TxHash, RelayError> {
    let deadline = request.deadline_timestamp();
    if deadline.is_expired_at(now) {
        return Err(RelayError::Expired { deadline, now });
    }

    let on_chain = network.relay_nonce(relay, request.user).await?;
    if on_chain != request.nonce {
        return Err(RelayError::RelayExecution {
            reason: RevertReason::StaleNonce,
            message: Some(format!(
                "request nonce {} but relay expects {on_chain}",
                request.nonce
            )),
            tx_hash: None,
        });
    }

    let tx_hash = network
        .execute_relay(
            relay,
            request,
            bundle.user_signature.clone(),
            bundle.operator_signature.clone(),
        )
        .await?;

    #[cfg(feature = "telemetry")]
    tracing::info!(%tx_hash, "relay executed");

    Ok(tx_hash)
}
