#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for gasless relay purchases.
//!
//! A user pays for an on-chain token purchase with a stable-coin balance while
//! a relay operator submits the transaction and pays gas. Both parties sign the
//! same structured relay request: the user with an EIP-712 signature, the
//! operator over the request's typed-data digest.
//!
//! This crate holds the chain-agnostic pieces shared by every implementation:
//!
//! - [`chain`] - chain identifiers, [`ChainProfile`](chain::ChainProfile) and the
//!   injected [`RelayRegistry`](chain::RelayRegistry)
//! - [`networks`] - known networks and their default payment tokens
//! - [`config`] - relay configuration resolved once at startup
//! - [`timestamp`] - Unix timestamps used for request deadlines
//! - [`error`] - the error taxonomy and retry classification
//!
//! The EVM implementation of the protocol lives in `urelay-evm`.

pub mod chain;
pub mod config;
pub mod error;
pub mod networks;
pub mod timestamp;

pub use chain::{ChainId, ChainProfile, RelayRegistry};
pub use config::{OperatorDigestEncoding, RelayConfig};
pub use error::{PurchaseError, PurchaseStep, RelayError, RetryHint, RevertReason};
pub use timestamp::UnixTimestamp;
