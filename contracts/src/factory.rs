//! # Smart Account Factory
//!
//! Deploys accounts at addresses that are known before deployment, so a
//! user can receive funds and build a first user operation for an account
//! that does not exist yet.
//!
//! ```text
//! salt'   = keccak(abi.encode(owner, salt))
//! address = keccak(0xff || factory || salt' || keccak("aegis.SmartAccount.v1"))[12..]
//! ```
//!
//! This is the CREATE2 derivation with a fixed "init code" label standing
//! in for contract bytecode.

use aegis_protocol::crypto::keccak256_concat;
use aegis_protocol::storage::{AccountState, Ledger};
use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall, SolValue};
use thiserror::Error;

/// Label hashed in place of account bytecode.
pub const ACCOUNT_INIT_LABEL: &str = "aegis.SmartAccount.v1";

sol! {
    function createAccount(address owner, uint256 salt) external;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// Accounts must start with a real owner.
    #[error("account owner must be non-zero")]
    ZeroOwner,

    /// `init_code` is not `factory ++ createAccount(owner, salt)`.
    #[error("malformed init code: {reason}")]
    MalformedInitCode {
        /// What was wrong.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// SmartAccountFactory
// ---------------------------------------------------------------------------

/// A factory deployed at a fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartAccountFactory {
    address: Address,
}

impl SmartAccountFactory {
    /// Factory living at `address`.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// The factory's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Where `create_account(owner, salt)` deploys.
    pub fn get_address(&self, owner: Address, salt: U256) -> Address {
        let salted = keccak256((owner, salt).abi_encode());
        let init_hash = keccak256(ACCOUNT_INIT_LABEL.as_bytes());
        let digest = keccak256_concat(&[
            &[0xff],
            self.address.as_slice(),
            salted.as_slice(),
            init_hash.as_slice(),
        ]);
        Address::from_slice(&digest[12..])
    }

    /// Deploy an account for `owner` (or return the existing one).
    ///
    /// Idempotent: a second call with the same arguments returns the same
    /// address and leaves the existing account untouched, even if its owner
    /// has since been recovered to someone else.
    pub fn create_account(
        &self,
        ledger: &mut Ledger,
        owner: Address,
        salt: U256,
    ) -> Result<Address, FactoryError> {
        if owner == Address::ZERO {
            return Err(FactoryError::ZeroOwner);
        }
        let address = self.get_address(owner, salt);
        if !ledger.is_account(&address) {
            ledger.insert_account(address, AccountState::new(owner));
            tracing::info!(%address, %owner, %salt, "smart account deployed");
        }
        Ok(address)
    }

    /// `factory ++ createAccount(owner, salt)`, as placed in a user
    /// operation's `init_code`.
    pub fn init_code(&self, owner: Address, salt: U256) -> Bytes {
        let mut out = self.address.to_vec();
        out.extend_from_slice(&SolCall::abi_encode(&createAccountCall { owner, salt }));
        Bytes::from(out)
    }

    /// Parse `init_code` into `(factory, owner, salt)`.
    pub fn decode_init_code(init_code: &[u8]) -> Result<(Address, Address, U256), FactoryError> {
        let malformed = |reason: &str| FactoryError::MalformedInitCode {
            reason: reason.to_string(),
        };
        if init_code.len() < 20 {
            return Err(malformed("shorter than a factory address"));
        }
        let factory = Address::from_slice(&init_code[..20]);
        let call = &init_code[20..];
        if !call.starts_with(&createAccountCall::SELECTOR) {
            return Err(malformed("unknown factory function"));
        }
        let args =
            createAccountCall::abi_decode(call, true).map_err(|e| malformed(&e.to_string()))?;
        Ok((factory, args.owner, args.salt))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
