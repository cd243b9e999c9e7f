//! Scoped access to the operator key.
//!
//! The operator key authorizes sponsorship, so it is never a long-lived
//! parameter. An [`OperatorKeySource`] hands out an [`OperatorKey`] on demand;
//! [`OperatorSigner`] acquires one for each digest it signs and drops it
//! before returning. The key's `Debug` output never contains secret material.

use std::fmt;

use alloy_primitives::{Address, B256, Signature};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use urelay::config::OperatorDigestEncoding;
use urelay::error::RelayError;

use crate::signer::DigestSigner;

/// Operator private key, held only while signing.
pub struct OperatorKey {
    signer: PrivateKeySigner,
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorKey")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl OperatorKey {
    /// Parses a hex private key, with or without `0x`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidKey`] when the input is not a valid
    /// secp256k1 private key. The error never echoes the input.
    pub fn parse(hex_key: &str) -> Result<Self, RelayError> {
        let hex_key = hex_key.trim();
        if hex_key.is_empty() {
            return Err(RelayError::InvalidKey("operator key is empty".to_owned()));
        }
        let signer: PrivateKeySigner = hex_key.parse().map_err(|_| {
            RelayError::InvalidKey("not a 32-byte hex secp256k1 private key".to_owned())
        })?;
        Ok(Self { signer })
    }

    /// Operator address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign(
        &self,
        digest: &B256,
        encoding: OperatorDigestEncoding,
    ) -> Result<Signature, RelayError> {
        let signature = match encoding {
            OperatorDigestEncoding::PersonalMessage => {
                self.signer.sign_message(digest.as_slice()).await
            }
            OperatorDigestEncoding::Raw => self.signer.sign_hash(digest).await,
        };
        signature.map_err(|e| RelayError::Signing(e.to_string()))
    }
}

/// Hands out the operator key for one signing operation.
pub trait OperatorKeySource: Send + Sync {
    /// Produces the key.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidKey`] if the key is unavailable or malformed.
    fn acquire(&self) -> Result<OperatorKey, RelayError>;
}

/// Reads the operator key from an environment variable at acquisition time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOperatorKey {
    var: String,
}

impl EnvOperatorKey {
    /// Source reading the variable `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the environment variable.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl OperatorKeySource for EnvOperatorKey {
    fn acquire(&self) -> Result<OperatorKey, RelayError> {
        let value = std::env::var(&self.var).map_err(|_| {
            RelayError::InvalidKey(format!("environment variable {} is not set", self.var))
        })?;
        OperatorKey::parse(&value)
    }
}

/// Key material supplied by the caller in memory.
///
/// Parsed on every acquisition so that the signing key itself is not kept
/// alive between signatures.
#[derive(Clone)]
pub struct InlineOperatorKey {
    hex_key: String,
}

impl fmt::Debug for InlineOperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineOperatorKey").finish_non_exhaustive()
    }
}

impl InlineOperatorKey {
    /// Wraps a hex private key.
    pub fn new(hex_key: impl Into<String>) -> Self {
        Self {
            hex_key: hex_key.into(),
        }
    }
}

impl OperatorKeySource for InlineOperatorKey {
    fn acquire(&self) -> Result<OperatorKey, RelayError> {
        OperatorKey::parse(&self.hex_key)
    }
}

/// Operator-side [`DigestSigner`] backed by an [`OperatorKeySource`].
#[derive(Debug, Clone)]
pub struct OperatorSigner<K> {
    source: K,
    encoding: OperatorDigestEncoding,
}

impl<K: OperatorKeySource> OperatorSigner<K> {
    /// Signs with the default [`OperatorDigestEncoding::PersonalMessage`].
    pub fn new(source: K) -> Self {
        Self {
            source,
            encoding: OperatorDigestEncoding::default(),
        }
    }

    /// Overrides the digest encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: OperatorDigestEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// The configured digest encoding.
    #[must_use]
    pub const fn encoding(&self) -> OperatorDigestEncoding {
        self.encoding
    }

    /// Acquires the key once to report its address.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidKey`] if the key cannot be acquired.
    pub fn address(&self) -> Result<Address, RelayError> {
        Ok(self.source.acquire()?.address())
    }
}

impl<K: OperatorKeySource> DigestSigner for OperatorSigner<K> {
    async fn sign_digest(&self, digest: &B256) -> Result<Signature, RelayError> {
        let key = self.source.acquire()?;
        let signature = key.sign(digest, self.encoding).await;
        drop(key);
        signature
    }
}
