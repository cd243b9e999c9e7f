//! Dual-signature authorization of a relay request.
//!
//! The user signs the request as EIP-712 typed data through their
//! [`StructuredSigner`]; the signer derives the digest itself. The operator
//! signs the typed-data digest of the same (domain, request) pair through a
//! [`DigestSigner`]. The asymmetry is deliberate and is what the relay
//! contract verifies.

use alloy_primitives::{B256, Bytes};
use alloy_sol_types::Eip712Domain;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use urelay::error::RelayError;

use crate::contract::RelayRequest;
use crate::request::relay_digest;
use crate::signer::{DigestSigner, StructuredSigner};

/// Both signatures over one relay request. Used once, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBundle {
    /// User's 65-byte EIP-712 signature.
    pub user_signature: Bytes,
    /// Operator's 65-byte signature over the typed-data digest.
    pub operator_signature: Bytes,
    /// Typed-data digest the operator signed.
    pub digest: B256,
}

/// Collects the user and operator signatures for `request`.
///
/// # Errors
///
/// - [`RelayError::SignerMismatch`] if `request.user` is not the user signer
/// - [`RelayError::UserRejected`] if the user declines
/// - [`RelayError::InvalidKey`] if the operator key is malformed
/// - [`RelayError::Signing`] for any other signer failure
#[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
    user = %request.user,
    nonce = %request.nonce,
)))]
pub async fn authorize<U, O>(
    domain: &Eip712Domain,
    request: &RelayRequest,
    user: &U,
    operator: &O,
) -> Result<SignatureBundle, RelayError>
where
    U: StructuredSigner,
    O: DigestSigner,
{
    let signer_address = user.address();
    if request.user != signer_address {
        return Err(RelayError::SignerMismatch {
            expected: request.user,
            actual: signer_address,
        });
    }

    let user_signature = user.sign_typed(domain, request).await?;

    let digest = relay_digest(domain, request);
    let operator_signature = operator.sign_digest(&digest).await?;

    Ok(SignatureBundle {
        user_signature: user_signature.as_bytes().into(),
        operator_signature: operator_signature.as_bytes().into(),
        digest,
    })
}
