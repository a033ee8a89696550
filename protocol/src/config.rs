//! # Protocol Configuration & Constants
//!
//! Every magic number in Aegis lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Two kinds of values live in this module:
//!
//! - **Wire constants** (field widths, Poseidon parameters, EIP-712 domain
//!   strings). Changing one of these silently invalidates every commitment,
//!   nullifier, and signature produced against the old value. Don't.
//! - **Chain configuration** ([`ChainConfig`]), which differs per
//!   deployment and is loaded from JSON by the node.

use std::path::Path;

use alloy_primitives::{address, Address};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Encoding Widths
// ---------------------------------------------------------------------------

/// Width of a serialized BN254 scalar field element.
pub const FIELD_ELEMENT_LENGTH: usize = 32;

/// Width of an account or key address.
pub const ADDRESS_LENGTH: usize = 20;

/// Zero bytes prepended to an address when it is lifted into a field
/// element. The address occupies the low-order bytes.
pub const ADDRESS_PADDING: usize = FIELD_ELEMENT_LENGTH - ADDRESS_LENGTH;

/// Recoverable secp256k1 signature: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Decimal form of the BN254 scalar field modulus. Kept for documentation
/// and tests; arithmetic uses `ark_bn254::Fr` directly.
pub const BN254_SCALAR_MODULUS: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

// ---------------------------------------------------------------------------
// Poseidon Parameters
// ---------------------------------------------------------------------------

/// Full rounds of the Poseidon permutation (split evenly around the
/// partial rounds).
pub const POSEIDON_FULL_ROUNDS: usize = 8;

/// Partial rounds for a width-3 permutation over BN254 at 128-bit security.
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// S-box exponent. x^5 is a permutation of Fr because gcd(5, r - 1) = 1.
pub const POSEIDON_ALPHA: u64 = 5;

/// Sponge rate (field elements absorbed per permutation).
pub const POSEIDON_RATE: usize = 2;

/// Sponge capacity.
pub const POSEIDON_CAPACITY: usize = 1;

// ---------------------------------------------------------------------------
// Typed Data (EIP-712)
// ---------------------------------------------------------------------------

/// Domain name guardians sign under.
pub const EIP712_DOMAIN_NAME: &str = "SmartAccount";

/// Domain version guardians sign under.
pub const EIP712_DOMAIN_VERSION: &str = "1";

// ---------------------------------------------------------------------------
// Chain Defaults
// ---------------------------------------------------------------------------

/// Local devnet chain id (the usual Hardhat/Anvil default).
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Canonical ERC-4337 v0.7 entry point address.
pub const ENTRY_POINT_ADDRESS: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

/// Address of the account factory on the default deployment.
pub const ACCOUNT_FACTORY_ADDRESS: Address = address!("91E60e0613810449d098b0b5Ec8b51A0FE8c8985");

/// Base fee used for gas pricing when none is configured.
pub const DEFAULT_BASE_FEE: u128 = 0;

// ---------------------------------------------------------------------------
// Gas Schedule
// ---------------------------------------------------------------------------
//
// There is no EVM underneath, so execution cost follows a flat schedule.
// The numbers are in the same ballpark as the real contracts so that gas
// limits copied from a bundler estimate behave sensibly here.

/// Cost of recovering the owner's signature during validation.
pub const SIGNATURE_VALIDATION_GAS: u128 = 6_000;

/// Cost of deploying an account from `init_code` during validation.
pub const ACCOUNT_DEPLOYMENT_GAS: u128 = 120_000;

/// Fixed overhead of entering `execute`.
pub const EXECUTION_BASE_GAS: u128 = 5_000;

/// Per-byte cost of the inner call data.
pub const CALLDATA_BYTE_GAS: u128 = 16;

/// Cost of moving native value to a plain address.
pub const VALUE_TRANSFER_GAS: u128 = 9_000;

/// Cost of writing a guardian configuration slot.
pub const GUARDIAN_UPDATE_GAS: u128 = 20_000;

/// Cost of a proof-based recovery (dominated by the pairing check).
pub const PROOF_RECOVERY_GAS: u128 = 250_000;

/// Cost of a signature-based recovery.
pub const SIGNATURE_RECOVERY_GAS: u128 = 30_000;

// ---------------------------------------------------------------------------
// Chain Configuration
// ---------------------------------------------------------------------------

/// Per-deployment parameters: which chain we're on and where the
/// well-known contracts live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain id mixed into user-operation hashes and EIP-712 domains.
    pub chain_id: u64,
    /// Address of the execution entry point.
    pub entry_point: Address,
    /// Address of the account factory referenced by `init_code`.
    pub factory: Address,
    /// Base fee per gas used when pricing user operations.
    #[serde(default)]
    pub base_fee: u128,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            entry_point: ENTRY_POINT_ADDRESS,
            factory: ACCOUNT_FACTORY_ADDRESS,
            base_fee: DEFAULT_BASE_FEE,
        }
    }
}

impl ChainConfig {
    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read chain config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("malformed chain config {}", path.display()))
    }

    /// Write this configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("chain config serialization")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write chain config {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
