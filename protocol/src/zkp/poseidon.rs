//! # FieldHash — Poseidon over BN254
//!
//! The one hash that commitments and nullifiers are built from. It has to
//! be cheap inside an R1CS circuit (SHA-2 and Keccak cost tens of thousands
//! of constraints per call; Poseidon costs a few hundred), which is why it
//! is not Keccak like everything else.
//!
//! ## Construction
//!
//! A duplex sponge over `Fr` with width 3 (rate 2, capacity 1), x^5 S-box,
//! 8 full and 57 partial rounds. Round constants and the MDS matrix come
//! from the reference Grain LFSR, so the parameters are reproducible by
//! anyone and chosen by no one.
//!
//! `hash(x_1, ..., x_n)` absorbs `n` first and then each input, and
//! squeezes a single element. Absorbing the arity keeps `H(a)` and
//! `H(a, 0)` distinct (zero-padding would otherwise collide them).
//!
//! The in-circuit version lives in [`crate::zkp::circuit`] and follows this
//! absorb order exactly.

use std::sync::OnceLock;

use alloy_primitives::Address;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{
    find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge,
};
use ark_crypto_primitives::sponge::{CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::PrimeField;

use super::field::FieldElement;
use crate::config::{
    POSEIDON_ALPHA, POSEIDON_CAPACITY, POSEIDON_FULL_ROUNDS, POSEIDON_PARTIAL_ROUNDS,
    POSEIDON_RATE,
};

/// Process-wide Poseidon parameters, generated on first use.
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            u64::from(Fr::MODULUS_BIT_SIZE),
            POSEIDON_RATE,
            POSEIDON_FULL_ROUNDS as u64,
            POSEIDON_PARTIAL_ROUNDS as u64,
            0,
        );
        PoseidonConfig {
            full_rounds: POSEIDON_FULL_ROUNDS,
            partial_rounds: POSEIDON_PARTIAL_ROUNDS,
            alpha: POSEIDON_ALPHA,
            ark,
            mds,
            rate: POSEIDON_RATE,
            capacity: POSEIDON_CAPACITY,
        }
    })
}

/// Poseidon over raw arkworks scalars.
pub fn hash_fr(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::<Fr>::new(poseidon_config());
    sponge.absorb(&Fr::from(inputs.len() as u64));
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_native_field_elements(1)[0]
}

/// `FieldHash(inputs...)`.
pub fn hash(inputs: &[FieldElement]) -> FieldElement {
    let raw: Vec<Fr> = inputs.iter().map(FieldElement::to_fr).collect();
    FieldElement::from_fr(hash_fr(&raw))
}

/// Guardian commitment: `FieldHash(secret_key, secret_answer)`.
pub fn commitment(secret_key: &FieldElement, secret_answer: &FieldElement) -> FieldElement {
    hash(&[*secret_key, *secret_answer])
}

/// Nullifier for one ownership transition:
/// `FieldHash(secret_key, FieldHash(secret_answer), new_owner, current_owner)`.
pub fn nullifier(
    secret_key: &FieldElement,
    secret_answer: &FieldElement,
    new_owner: &Address,
    current_owner: &Address,
) -> FieldElement {
    let hashed_answer = hash(&[*secret_answer]);
    hash(&[
        *secret_key,
        hashed_answer,
        FieldElement::from_address(new_owner),
        FieldElement::from_address(current_owner),
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
