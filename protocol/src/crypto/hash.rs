//! # Hashing Utilities
//!
//! Two hash functions, two jobs, no overlap:
//!
//! - **Keccak-256** — everything that has to agree with EVM tooling:
//!   ABI selectors, EIP-712 digests, user-operation hashes, addresses.
//!   Wallets compute these independently, so we compute them exactly the
//!   way they do.
//!
//! - **BLAKE3** — internal bookkeeping that nobody outside this workspace
//!   ever recomputes, such as the ledger state root.
//!
//! Circuit-friendly hashing (commitments, nullifiers) is a third job with
//! its own module: see [`crate::zkp::poseidon`].

use alloy_primitives::{keccak256, B256};

/// EIP-191 prefix for a 32-byte personal message.
const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Keccak-256 over the concatenation of several byte strings.
///
/// Saves callers from allocating an intermediate buffer just to hash it.
pub fn keccak256_concat(parts: &[&[u8]]) -> B256 {
    let total: usize = parts.iter().map(|p| p.len()).sum();
    let mut buf = Vec::with_capacity(total);
    for part in parts {
        buf.extend_from_slice(part);
    }
    keccak256(&buf)
}

/// `toEthSignedMessageHash(hash)`: the digest a wallet actually signs when
/// asked to `personal_sign` a 32-byte value.
pub fn eth_signed_message_hash(hash: &B256) -> B256 {
    keccak256_concat(&[PERSONAL_MESSAGE_PREFIX, hash.as_slice()])
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
