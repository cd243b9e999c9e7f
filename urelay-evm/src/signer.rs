//! Signing capabilities of the two parties.
//!
//! The user and the operator sign the same request through different
//! primitives, so each gets its own trait:
//!
//! - [`StructuredSigner`] signs an EIP-712 struct under a domain. The signer
//!   derives the digest itself; wallets show the typed fields to the user.
//! - [`DigestSigner`] signs an already computed 32-byte digest.
//!
//! [`PrivateKeySigner`] implements [`StructuredSigner`] for local users.
//! The operator side is implemented by
//! [`OperatorSigner`](crate::operator::OperatorSigner), which only holds the
//! key for the duration of one signature.

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Signature};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Eip712Domain, SolStruct};
use urelay::error::RelayError;

/// Failure of a structured signer.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// The key holder declined to sign.
    #[error("signature request rejected")]
    Rejected,
    /// The signer failed.
    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),
}

impl From<SignError> for RelayError {
    fn from(value: SignError) -> Self {
        match value {
            SignError::Rejected => Self::UserRejected,
            SignError::Signer(e) => Self::Signing(e.to_string()),
        }
    }
}

/// A party that signs EIP-712 typed data.
pub trait StructuredSigner: Send + Sync {
    /// Address the signatures recover to.
    fn address(&self) -> Address;

    /// Signs `message` under `domain`.
    fn sign_typed<T: SolStruct + Send + Sync>(
        &self,
        domain: &Eip712Domain,
        message: &T,
    ) -> impl Future<Output = Result<Signature, SignError>> + Send;
}

impl StructuredSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        Signer::address(self)
    }

    async fn sign_typed<T: SolStruct + Send + Sync>(
        &self,
        domain: &Eip712Domain,
        message: &T,
    ) -> Result<Signature, SignError> {
        Ok(self.sign_typed_data(message, domain).await?)
    }
}

impl<S: StructuredSigner> StructuredSigner for Arc<S> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_typed<T: SolStruct + Send + Sync>(
        &self,
        domain: &Eip712Domain,
        message: &T,
    ) -> Result<Signature, SignError> {
        (**self).sign_typed(domain, message).await
    }
}

/// A party that signs a precomputed 32-byte digest.
pub trait DigestSigner: Send + Sync {
    /// Signs `digest`.
    fn sign_digest(
        &self,
        digest: &B256,
    ) -> impl Future<Output = Result<Signature, RelayError>> + Send;
}

impl<S: DigestSigner> DigestSigner for Arc<S> {
    async fn sign_digest(&self, digest: &B256) -> Result<Signature, RelayError> {
        (**self).sign_digest(digest).await
    }
}
