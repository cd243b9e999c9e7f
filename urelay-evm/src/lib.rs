#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (EVM) implementation of gasless relay purchases.
//!
//! A user buys a token with a stable-coin while a relay operator pays gas.
//! The user approves the relay contract once, then every purchase is a
//! [`RelayRequest`] signed twice: by the user as EIP-712 typed data and by the
//! operator over the request's typed-data digest. The relay contract verifies
//! both, consumes the user's nonce and pulls the payment.
//!
//! # Architecture
//!
//! - [`contract`] - Solidity bindings for the relay contract and ERC-20
//! - [`request`] - request construction, EIP-712 domain and digest
//! - [`signer`] - user and operator signing capabilities
//! - [`operator`] - scoped access to the operator key
//! - [`authorize`] - dual-signature authorization
//! - [`network`] - chain access over an alloy provider
//! - [`allowance`] - payment-token approval toward the relay
//! - [`nonce`] - relay nonce reads and per-user purchase locks
//! - [`submit`] - relay submission with local prechecks
//! - [`purchase`] - the end-to-end [`GaslessPurchase`] pipeline
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` spans and events for every pipeline step
//!
//! # Example
//!
//! ```no_run
//! use alloy_primitives::{U256, address};
//! use alloy_provider::ProviderBuilder;
//! use alloy_signer_local::PrivateKeySigner;
//! use urelay::RelayConfig;
//! use urelay_evm::{Eip155RelayNetwork, EnvOperatorKey, GaslessPurchase, OperatorSigner};
//!
//! # async fn run(config: RelayConfig, user: PrivateKeySigner) -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ProviderBuilder::new()
//!     .wallet(user.clone())
//!     .connect_http("https://polygon-rpc.com".parse()?);
//! let network = Eip155RelayNetwork::new(provider);
//! let purchase = GaslessPurchase::from_config(network, user, &config)?;
//!
//! let operator = OperatorSigner::new(EnvOperatorKey::new(&config.operator_key_env))
//!     .with_encoding(config.operator_digest);
//! let token = address!("BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB");
//! let tx_hash = purchase
//!     .purchase_with_relay(&operator, token, U256::from(50_000_000u64))
//!     .await?;
//! println!("confirmed in {tx_hash}");
//! # Ok(())
//! # }
//! ```

pub mod allowance;
pub mod authorize;
pub mod contract;
pub mod network;
pub mod nonce;
pub mod operator;
pub mod purchase;
pub mod request;
pub mod signer;
pub mod submit;

#[cfg(test)]
mod testing;

pub use allowance::{AllowanceOutcome, ensure_allowance};
pub use authorize::{SignatureBundle, authorize};
pub use contract::RelayRequest;
pub use network::{Eip155RelayNetwork, RelayNetwork};
pub use nonce::{PurchaseLocks, fetch_nonce};
pub use operator::{EnvOperatorKey, InlineOperatorKey, OperatorKey, OperatorKeySource, OperatorSigner};
pub use purchase::{GaslessPurchase, PurchaseOrder, PurchaseReceipt};
pub use request::{RelayRequestParams, build_relay_request, relay_digest, relay_domain};
pub use signer::{DigestSigner, SignError, StructuredSigner};
pub use submit::submit_relay;
