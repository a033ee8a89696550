//! # Typed Structured Data (EIP-712)
//!
//! Signature-mode guardians authorize a recovery by signing a typed
//! `Recover` message in the domain of the account being recovered:
//!
//! ```text
//! EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)
//! Recover(address currentOwner,address newOwner,uint256 nonce)
//! ```
//!
//! with `name = "SmartAccount"`, `version = "1"`. Any wallet's
//! `eth_signTypedData_v4` produces a signature this module accepts, and
//! vice versa.

use alloy_primitives::Address;
use alloy_sol_types::{eip712_domain, sol, Eip712Domain};

use crate::config::{EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION};

sol! {
    /// The message a signature-mode guardian signs to move ownership.
    #[derive(Debug, PartialEq, Eq)]
    struct Recover {
        address currentOwner;
        address newOwner;
        uint256 nonce;
    }
}

/// The domain every smart account verifies guardian signatures in.
pub fn smart_account_domain(chain_id: u64, account: Address) -> Eip712Domain {
    eip712_domain! {
        name: EIP712_DOMAIN_NAME,
        version: EIP712_DOMAIN_VERSION,
        chain_id: chain_id,
        verifying_contract: account,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
