// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Aegis Protocol — Core Library
//!
//! Primitives for accounts that can survive losing their key. An account
//! has exactly one owner; a designated guardian can move ownership to a new
//! key, either by signing an EIP-712 message or by proving in zero
//! knowledge that they know the secret behind a commitment the owner
//! registered earlier. The proof reveals nothing about the secret and
//! carries a nullifier, so it cannot be replayed.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants, gas schedule, and chain parameters.
//! - **crypto** — Keccak, secp256k1 keys and recoverable signatures, EIP-712.
//! - **zkp** — Poseidon FieldHash, the Groth16 recovery circuit, prover and verifier.
//! - **storage** — The ledger (accounts, nullifiers, balances) and its sled snapshot.
//!
//! Account logic itself (registry, recovery coordinator, entry point) lives
//! in the `aegis-contracts` crate on top of these.
//!
//! ## Design Philosophy
//!
//! 1. A failed transition leaves no trace. Validate everything, then write.
//! 2. Untrusted bytes never panic; they are rejected.
//! 3. Proof verification sits behind a trait. Account code never learns
//!    which proving system is on the other side.
//! 4. If it can move ownership, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod storage;
pub mod zkp;
