//! Error types for gasless relay purchases.
//!
//! [`RelayError`] is what an individual step fails with. The purchase pipeline
//! wraps it in a [`PurchaseError`] that records which [`PurchaseStep`] failed
//! and on which chain, so the caller can decide from [`RetryHint`] whether to
//! retry and from where. Nothing inside the pipeline retries on its own.

use std::fmt;

use alloy_primitives::{Address, TxHash};

use crate::chain::ChainId;
use crate::timestamp::UnixTimestamp;

/// Failure of a single relay step.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No relay is registered for the connected chain.
    #[error("no relay registered for chain {0}")]
    UnsupportedChain(ChainId),

    /// The approval transaction could not be sent, reverted, or never confirmed.
    #[error("approval failed: {0}")]
    ApprovalFailed(String),

    /// A read-only RPC call failed.
    #[error("rpc call failed: {0}")]
    Rpc(String),

    /// The relay transaction could not be broadcast or confirmed.
    #[error("relay submission failed: {0}")]
    Submission(String),

    /// The relay contract rejected the request.
    #[error("relay execution reverted ({reason}){}", fmt_revert(.message, .tx_hash))]
    RelayExecution {
        /// Classified cause of the revert.
        reason: RevertReason,
        /// Revert message reported by the node, if any.
        message: Option<String>,
        /// Hash of the mined transaction when the revert happened on-chain.
        tx_hash: Option<TxHash>,
    },

    /// The request deadline passed before submission.
    #[error("relay request expired at {deadline} (now {now})")]
    Expired {
        /// Deadline carried by the request.
        deadline: UnixTimestamp,
        /// Time of the check.
        now: UnixTimestamp,
    },

    /// The user declined the signing prompt.
    #[error("user rejected the signature request")]
    UserRejected,

    /// A signer failed for a reason other than user rejection.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The request names a user other than the structured signer.
    #[error("request user {expected} does not match signer {actual}")]
    SignerMismatch {
        /// `user` field of the request.
        expected: Address,
        /// Address of the structured signer.
        actual: Address,
    },

    /// Payment amount must be greater than zero.
    #[error("payment amount must be greater than zero")]
    InvalidAmount,

    /// Operator key material is missing or malformed.
    #[error("invalid operator key: {0}")]
    InvalidKey(String),
}

#[allow(clippy::ref_option)]
fn fmt_revert(message: &Option<String>, tx_hash: &Option<TxHash>) -> String {
    let mut out = String::new();
    if let Some(message) = message {
        out.push_str(": ");
        out.push_str(message);
    }
    if let Some(tx_hash) = tx_hash {
        out.push_str(&format!(" in transaction {tx_hash}"));
    }
    out
}

impl RelayError {
    /// Builds a [`RelayError::RelayExecution`] by classifying a revert message.
    #[must_use]
    pub fn reverted(message: Option<String>, tx_hash: Option<TxHash>) -> Self {
        let reason = message
            .as_deref()
            .map_or(RevertReason::Other, RevertReason::classify);
        Self::RelayExecution {
            reason,
            message,
            tx_hash,
        }
    }

    /// Whether and how the failed attempt can be retried.
    #[must_use]
    pub const fn retry_hint(&self) -> RetryHint {
        match self {
            Self::ApprovalFailed(_) | Self::Rpc(_) | Self::Submission(_) => {
                RetryHint::RetryFromScratch
            }
            Self::Expired { .. } => RetryHint::RebuildRequest,
            Self::RelayExecution { reason, .. } => reason.retry_hint(),
            Self::UnsupportedChain(_)
            | Self::UserRejected
            | Self::Signing(_)
            | Self::SignerMismatch { .. }
            | Self::InvalidAmount
            | Self::InvalidKey(_) => RetryHint::Fatal,
        }
    }
}

/// Classified cause of a relay contract revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevertReason {
    /// The request nonce no longer matches the on-chain nonce.
    StaleNonce,
    /// The request deadline has passed.
    DeadlineExpired,
    /// The relay may not pull the payment amount from the user.
    InsufficientAllowance,
    /// The user holds less than the payment amount.
    InsufficientBalance,
    /// Either signature failed on-chain verification.
    InvalidSignature,
    /// Anything else, including reverts without a reason.
    Other,
}

impl RevertReason {
    /// Classifies a revert message by keyword.
    ///
    /// Relay contracts differ in wording, so matching is case-insensitive
    /// and looks for the subject of the failure rather than exact strings.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let message = message.to_ascii_lowercase();
        if message.contains("nonce") {
            Self::StaleNonce
        } else if message.contains("deadline") || message.contains("expired") {
            Self::DeadlineExpired
        } else if message.contains("allowance") {
            Self::InsufficientAllowance
        } else if message.contains("balance") {
            Self::InsufficientBalance
        } else if message.contains("signature") || message.contains("signer") {
            Self::InvalidSignature
        } else {
            Self::Other
        }
    }

    /// Retry policy for this revert.
    #[must_use]
    pub const fn retry_hint(self) -> RetryHint {
        match self {
            Self::StaleNonce => RetryHint::RefreshNonce,
            Self::DeadlineExpired => RetryHint::RebuildRequest,
            Self::InsufficientAllowance | Self::InsufficientBalance | Self::InvalidSignature => {
                RetryHint::Fatal
            }
            Self::Other => RetryHint::RetryFromScratch,
        }
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StaleNonce => "stale nonce",
            Self::DeadlineExpired => "deadline expired",
            Self::InsufficientAllowance => "insufficient allowance",
            Self::InsufficientBalance => "insufficient balance",
            Self::InvalidSignature => "invalid signature",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// What the caller may do after a failed purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryHint {
    /// Do not retry without a configuration change or new user action.
    Fatal,
    /// Re-run from the nonce fetch: nonce, build, sign, submit.
    RefreshNonce,
    /// Rebuild the request with a fresh deadline, then sign and submit.
    RebuildRequest,
    /// Transient failure; re-run the whole purchase, re-reading allowance and nonce.
    RetryFromScratch,
}

impl RetryHint {
    /// Whether any kind of retry is allowed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        !matches!(self, Self::Fatal)
    }
}

/// Pipeline step a purchase failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurchaseStep {
    /// Reading the active chain and resolving its relay profile.
    ResolveChain,
    /// Checking and, if needed, raising the payment-token allowance.
    Allowance,
    /// Reading the user's relay nonce.
    Nonce,
    /// Building the relay request.
    Build,
    /// Producing the user and operator signatures.
    Authorize,
    /// Submitting to the relay contract and awaiting confirmation.
    Submit,
}

impl fmt::Display for PurchaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ResolveChain => "resolve_chain",
            Self::Allowance => "allowance",
            Self::Nonce => "nonce",
            Self::Build => "build",
            Self::Authorize => "authorize",
            Self::Submit => "submit",
        };
        f.write_str(s)
    }
}

/// A purchase that aborted, with the step and chain it failed on.
#[derive(Debug, thiserror::Error)]
#[error("purchase failed at step {step}{}: {source}", fmt_chain(.chain_id))]
pub struct PurchaseError {
    /// Step that failed.
    pub step: PurchaseStep,
    /// Active chain, unknown when reading it failed.
    pub chain_id: Option<ChainId>,
    /// Underlying failure.
    #[source]
    pub source: RelayError,
}

#[allow(clippy::ref_option)]
fn fmt_chain(chain_id: &Option<ChainId>) -> String {
    chain_id.map_or_else(String::new, |id| format!(" on chain {id}"))
}

impl PurchaseError {
    /// Wraps a step failure with its context.
    #[must_use]
    pub const fn new(step: PurchaseStep, chain_id: Option<ChainId>, source: RelayError) -> Self {
        Self {
            step,
            chain_id,
            source,
        }
    }

    /// Retry policy derived from the underlying failure.
    #[must_use]
    pub const fn retry_hint(&self) -> RetryHint {
        self.source.retry_hint()
    }
}
