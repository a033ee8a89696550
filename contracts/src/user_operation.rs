//! # User Operations
//!
//! The unit of work the entry point executes on an account's behalf, in the
//! ERC-4337 v0.7 "packed" shape: the two verification/call gas limits share
//! one word, as do the two fee caps.
//!
//! ```text
//! accountGasLimits = verificationGasLimit << 128 | callGasLimit
//! gasFees          = maxPriorityFeePerGas  << 128 | maxFeePerGas
//!
//! pack(op) = abi.encode(sender, nonce, keccak(initCode), keccak(callData),
//!                       accountGasLimits, preVerificationGas, gasFees,
//!                       keccak(paymasterAndData))
//! hash(op) = keccak(abi.encode(keccak(pack(op)), entryPoint, chainId))
//! ```
//!
//! The signature is not part of the hash; the owner signs the EIP-191
//! message of `hash(op)`.

use aegis_protocol::crypto::{Keypair, SignatureError};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

/// Call gas used by [`UserOperation::new`].
pub const DEFAULT_CALL_GAS_LIMIT: u128 = 300_000;

/// Verification gas used by [`UserOperation::new`].
pub const DEFAULT_VERIFICATION_GAS_LIMIT: u128 = 150_000;

/// Pre-verification gas used by [`UserOperation::new`].
pub const DEFAULT_PRE_VERIFICATION_GAS: u64 = 21_000;

/// A packed user operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    /// The smart account executing the operation.
    pub sender: Address,
    /// Must equal the account's execution nonce.
    pub nonce: U256,
    /// `factory ++ createAccount(owner, salt)` for first use, else empty.
    pub init_code: Bytes,
    /// Call into the account, normally `execute(address,uint256,bytes)`.
    pub call_data: Bytes,
    /// Gas reserved for validation.
    pub verification_gas_limit: u128,
    /// Gas reserved for the call.
    pub call_gas_limit: u128,
    /// Flat overhead charged to the operation.
    pub pre_verification_gas: U256,
    /// Fee cap per gas.
    pub max_fee_per_gas: u128,
    /// Tip cap per gas.
    pub max_priority_fee_per_gas: u128,
    /// Paymaster sponsorship. Must be empty here.
    pub paymaster_and_data: Bytes,
    /// 65-byte owner signature over [`UserOperation::hash`].
    pub signature: Bytes,
}

impl UserOperation {
    /// An unsigned operation with default gas limits and zero fees.
    pub fn new(sender: Address, nonce: U256, call_data: impl Into<Bytes>) -> Self {
        Self {
            sender,
            nonce,
            init_code: Bytes::new(),
            call_data: call_data.into(),
            verification_gas_limit: DEFAULT_VERIFICATION_GAS_LIMIT,
            call_gas_limit: DEFAULT_CALL_GAS_LIMIT,
            pre_verification_gas: U256::from(DEFAULT_PRE_VERIFICATION_GAS),
            max_fee_per_gas: 0,
            max_priority_fee_per_gas: 0,
            paymaster_and_data: Bytes::new(),
            signature: Bytes::new(),
        }
    }

    /// Set both fee caps.
    pub fn with_fees(mut self, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    /// Set the gas limits.
    pub fn with_gas(
        mut self,
        verification_gas_limit: u128,
        call_gas_limit: u128,
        pre_verification_gas: U256,
    ) -> Self {
        self.verification_gas_limit = verification_gas_limit;
        self.call_gas_limit = call_gas_limit;
        self.pre_verification_gas = pre_verification_gas;
        self
    }

    /// Attach `init_code`.
    pub fn with_init_code(mut self, init_code: impl Into<Bytes>) -> Self {
        self.init_code = init_code.into();
        self
    }

    /// `verificationGasLimit << 128 | callGasLimit`.
    pub fn account_gas_limits(&self) -> U256 {
        pack_u128_pair(self.verification_gas_limit, self.call_gas_limit)
    }

    /// `maxPriorityFeePerGas << 128 | maxFeePerGas`.
    pub fn gas_fees(&self) -> U256 {
        pack_u128_pair(self.max_priority_fee_per_gas, self.max_fee_per_gas)
    }

    /// ABI encoding of every field except the signature, with the dynamic
    /// fields replaced by their hashes.
    pub fn pack(&self) -> Vec<u8> {
        (
            self.sender,
            self.nonce,
            keccak256(&self.init_code),
            keccak256(&self.call_data),
            self.account_gas_limits(),
            self.pre_verification_gas,
            self.gas_fees(),
            keccak256(&self.paymaster_and_data),
        )
            .abi_encode()
    }

    /// The user-operation hash, bound to one entry point and chain.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> B256 {
        keccak256((keccak256(self.pack()), entry_point, U256::from(chain_id)).abi_encode())
    }

    /// Sign as `owner` (EIP-191 over [`UserOperation::hash`]).
    pub fn sign(
        &mut self,
        owner: &Keypair,
        entry_point: Address,
        chain_id: u64,
    ) -> Result<(), SignatureError> {
        let signature = owner.sign_message_hash(&self.hash(entry_point, chain_id))?;
        self.signature = Bytes::from(signature.to_vec());
        Ok(())
    }

    /// `pre_verification_gas + verification_gas_limit + call_gas_limit`,
    /// or `None` on overflow.
    pub fn max_gas(&self) -> Option<U256> {
        self.pre_verification_gas
            .checked_add(U256::from(self.verification_gas_limit))?
            .checked_add(U256::from(self.call_gas_limit))
    }

    /// `max_gas * max_fee_per_gas`, or `None` on overflow.
    pub fn required_prefund(&self) -> Option<U256> {
        self.max_gas()?
            .checked_mul(U256::from(self.max_fee_per_gas))
    }

    /// `min(max_fee, max_priority + base_fee)`.
    pub fn gas_price(&self, base_fee: u128) -> u128 {
        self.max_fee_per_gas
            .min(self.max_priority_fee_per_gas.saturating_add(base_fee))
    }
}

fn pack_u128_pair(high: u128, low: u128) -> U256 {
    (U256::from(high) << 128usize) | U256::from(low)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
