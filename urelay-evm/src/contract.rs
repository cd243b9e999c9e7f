//! Solidity definitions for the relay contract and the payment token.
//!
//! Contains the minimal ABI surface the client touches:
//! - [`RelayRequest`]: the EIP-712 struct both parties sign
//! - [`IUniversalRelay`]: `executeRelay` and the per-user `nonces` counter
//! - [`IERC20`]: `allowance` and `approve` on the payment token

use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

sol! {
    /// Purchase intent signed by the user and co-signed by the operator.
    ///
    /// Field names, types and order form the EIP-712 type string
    /// `RelayRequest(address user,address targetContract,address targetToken,address paymentToken,uint256 amount,uint256 nonce,uint256 deadline)`.
    /// Deployed relay contracts hash exactly this string, so the definition
    /// must not be reordered or renamed.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct RelayRequest {
        address user;
        address targetContract;
        address targetToken;
        address paymentToken;
        uint256 amount;
        uint256 nonce;
        uint256 deadline;
    }

    /// Relay contract that executes dual-signed purchase requests.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IUniversalRelay {
        function executeRelay(RelayRequest request, bytes userSignature, bytes operatorSignature) external;
        function nonces(address user) external view returns (uint256);
    }
}

sol! {
    /// Minimal ERC-20 interface for allowance management.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
