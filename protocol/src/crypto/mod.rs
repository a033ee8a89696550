//! # Cryptographic Primitives
//!
//! Everything signature- and hash-shaped that the account layer touches.
//!
//! We deliberately chose boring, well-audited cryptography, matched to what
//! wallets already speak:
//!
//! - **secp256k1 ECDSA** (recoverable, 65 bytes) for owner and guardian
//!   signatures, because that's what every wallet signs with.
//! - **Keccak-256** for anything an external party recomputes.
//! - **EIP-712** typed data for guardian recovery approvals.
//! - **BLAKE3** for internal digests nobody else needs to reproduce.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Curve arithmetic comes from `k256`, Keccak from
//! `alloy-primitives`, typed-data hashing from `alloy-sol-types`, BLAKE3
//! from `blake3`. This module only picks the inputs.

pub mod eip712;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use eip712::{smart_account_domain, Recover};
pub use hash::{blake3_hash, eth_signed_message_hash, keccak256_concat};
pub use keys::{address_from_verifying_key, Keypair};
pub use signatures::{is_signed_by, recover_signer, RecoverableSignature, SignatureError};
