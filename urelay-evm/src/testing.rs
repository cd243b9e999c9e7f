//! In-memory relay network for tests.
//!
//! Mirrors what a compliant relay contract enforces: deadline, per-user nonce
//! consumed on success, user EIP-712 signature, operator signature over the
//! digest, and the payment-token allowance.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use alloy_primitives::{Address, Bytes, Signature, TxHash, U256, address, keccak256};
use urelay::chain::{ChainId, ChainProfile};
use urelay::config::OperatorDigestEncoding;
use urelay::error::RelayError;
use urelay::networks::USDC_POLYGON;
use urelay::timestamp::UnixTimestamp;

use crate::contract::RelayRequest;
use crate::network::RelayNetwork;
use crate::request::{relay_digest, relay_domain};

/// Anvil account #0, used as the paying user.
pub(crate) const USER_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Anvil account #1, used as the relay operator.
pub(crate) const OPERATOR_KEY: &str =
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

/// Address of anvil account #1.
pub(crate) const OPERATOR: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

pub(crate) const RELAY: Address = address!("CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC");

pub(crate) const POLYGON: ChainId = 137;

pub(crate) const fn profile() -> ChainProfile {
    ChainProfile {
        chain_id: POLYGON,
        relay_address: RELAY,
        payment_token_address: USDC_POLYGON,
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub allowance: U256,
    pub approvals: Vec<(Address, Address, U256)>,
    pub nonces: HashMap<Address, U256>,
    pub executed: Vec<RelayRequest>,
    /// Names of the contract calls in the order they were made.
    pub calls: Vec<&'static str>,
    pub fail_approval: bool,
    tx_count: u64,
}

impl MockState {
    fn next_tx_hash(&mut self) -> TxHash {
        self.tx_count += 1;
        keccak256(self.tx_count.to_be_bytes())
    }
}

#[derive(Debug)]
pub(crate) struct MockRelayNetwork {
    chain_id: ChainId,
    operator: Address,
    encoding: OperatorDigestEncoding,
    state: Mutex<MockState>,
}

impl MockRelayNetwork {
    pub(crate) fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            operator: OPERATOR,
            encoding: OperatorDigestEncoding::PersonalMessage,
            state: Mutex::new(MockState::default()),
        }
    }

    pub(crate) const fn with_encoding(mut self, encoding: OperatorDigestEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub(crate) fn with_allowance(self, allowance: U256) -> Self {
        self.state().allowance = allowance;
        self
    }

    pub(crate) fn with_nonce(self, user: Address, nonce: U256) -> Self {
        self.state().nonces.insert(user, nonce);
        self
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn verify(&self, relay: Address, request: &RelayRequest, user_sig: &[u8], operator_sig: &[u8]) -> Result<(), String> {
        let state = self.state();
        if request.deadline_timestamp().is_expired_at(UnixTimestamp::now()) {
            return Err("RelayRequest expired".to_owned());
        }
        let current = state.nonces.get(&request.user).copied().unwrap_or_default();
        if request.nonce != current {
            return Err("Invalid nonce".to_owned());
        }

        let domain = relay_domain(&ChainProfile {
            chain_id: self.chain_id,
            relay_address: relay,
            payment_token_address: request.paymentToken,
        });
        let digest = relay_digest(&domain, request);

        let user = Signature::from_raw(user_sig)
            .ok()
            .and_then(|s| s.recover_address_from_prehash(&digest).ok());
        if user != Some(request.user) {
            return Err("Invalid user signature".to_owned());
        }

        let operator = Signature::from_raw(operator_sig).ok().and_then(|s| match self.encoding {
            OperatorDigestEncoding::PersonalMessage => {
                s.recover_address_from_msg(digest.as_slice()).ok()
            }
            OperatorDigestEncoding::Raw => s.recover_address_from_prehash(&digest).ok(),
        });
        if operator != Some(self.operator) {
            return Err("Invalid operator signature".to_owned());
        }

        if state.allowance < request.amount {
            return Err("ERC20: insufficient allowance".to_owned());
        }
        Ok(())
    }
}

impl RelayNetwork for MockRelayNetwork {
    async fn chain_id(&self) -> Result<ChainId, RelayError> {
        Ok(self.chain_id)
    }

    async fn allowance(
        &self,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256, RelayError> {
        let mut state = self.state();
        state.calls.push("allowance");
        Ok(state.allowance)
    }

    async fn approve(
        &self,
        token: Address,
        _owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, RelayError> {
        let mut state = self.state();
        state.calls.push("approve");
        if state.fail_approval {
            return Err(RelayError::ApprovalFailed("transaction reverted".to_owned()));
        }
        state.approvals.push((token, spender, amount));
        state.allowance = amount;
        Ok(state.next_tx_hash())
    }

    async fn relay_nonce(&self, _relay: Address, user: Address) -> Result<U256, RelayError> {
        let nonce = {
            let mut state = self.state();
            state.calls.push("nonces");
            state.nonces.get(&user).copied().unwrap_or_default()
        };
        // Concurrent purchases interleave here, as they would around an RPC.
        tokio::task::yield_now().await;
        Ok(nonce)
    }

    async fn execute_relay(
        &self,
        relay: Address,
        request: &RelayRequest,
        user_signature: Bytes,
        operator_signature: Bytes,
    ) -> Result<TxHash, RelayError> {
        self.state().calls.push("executeRelay");
        self.verify(relay, request, &user_signature, &operator_signature)
            .map_err(|reason| RelayError::reverted(Some(reason), None))?;

        let mut state = self.state();
        state.allowance -= request.amount;
        state.nonces.insert(request.user, request.nonce + U256::from(1));
        state.executed.push(request.clone());
        Ok(state.next_tx_hash())
    }
}
