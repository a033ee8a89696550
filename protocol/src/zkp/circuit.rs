//! # Guardian Recovery R1CS Circuit
//!
//! This module defines the arithmetic circuit used inside the Groth16 SNARK.
//! The statement being proved is:
//!
//! ```text
//! "I know (secret_key, secret_answer) such that:
//!     1. H(secret_key, secret_answer) = commitment
//!     2. H(secret_key, H(secret_answer), new_owner, current_owner) = nullifier_hash"
//! ```
//!
//! where `H` is the Poseidon FieldHash from [`super::poseidon`], rebuilt
//! with `PoseidonSpongeVar` so every permutation round becomes constraints.
//!
//! ## Why both owners are public inputs
//!
//! The owners are not just "context": they are hashed into the nullifier,
//! and the verifier supplies them from the account's own state. A proof
//! produced for `(O1 -> O2)` carries a nullifier that only opens for
//! `(O1 -> O2)`. Swap either owner and the public-input vector changes, so
//! the pairing check fails.
//!
//! ## Constraint breakdown
//!
//! Rate 2 plus the arity tag means: `H(sa)` costs one permutation,
//! `H(sk, sa)` two, and the four-input nullifier hash three. Six width-3
//! permutations at roughly 240 constraints each keeps the whole circuit
//! under two thousand constraints.
//!
//! ## Public inputs (in order)
//!
//! | index | value |
//! |-------|-------|
//! | 0     | nullifier hash |
//! | 1     | guardian commitment |
//! | 2     | new owner, lifted with `FieldElement::from_address` |
//! | 3     | current owner, lifted the same way |

use alloy_primitives::Address;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::{
    alloc::AllocVar,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::field::FieldElement;
use super::guardian::{GuardianSecret, RecoveryStatement};
use super::poseidon::poseidon_config;

// ---------------------------------------------------------------------------
// Circuit definition
// ---------------------------------------------------------------------------

/// Groth16 R1CS circuit for a guardian-authorized ownership transition.
///
/// All witness and input fields are `Option<_>` so the struct can be
/// constructed with `None` values during Groth16 key generation, where
/// the constraint topology is fixed but no witness exists yet.
#[derive(Clone)]
pub struct RecoveryCircuit {
    /// Poseidon parameters (constants baked into the circuit).
    pub params: PoseidonConfig<Fr>,

    // -- Private witness ----------------------------------------------------
    /// Guardian secret key.
    pub secret_key: Option<Fr>,
    /// Guardian secret answer (encoded).
    pub secret_answer: Option<Fr>,

    // -- Public inputs ------------------------------------------------------
    /// Nullifier for this transition.
    pub nullifier_hash: Option<Fr>,
    /// Commitment stored on the account.
    pub commitment: Option<Fr>,
    /// New owner as a field element.
    pub new_owner: Option<Fr>,
    /// Current owner as a field element.
    pub current_owner: Option<Fr>,
}

impl RecoveryCircuit {
    /// Construct a fully-populated circuit for proof generation.
    pub fn new(secret: &GuardianSecret, statement: &RecoveryStatement) -> Self {
        Self {
            params: poseidon_config().clone(),
            secret_key: Some(secret.secret_key().to_fr()),
            secret_answer: Some(secret.secret_answer().to_fr()),
            nullifier_hash: Some(statement.nullifier_hash.to_fr()),
            commitment: Some(statement.commitment.to_fr()),
            new_owner: Some(FieldElement::from_address(&statement.new_owner).to_fr()),
            current_owner: Some(FieldElement::from_address(&statement.current_owner).to_fr()),
        }
    }

    /// Construct a blank circuit (for CRS generation).
    pub fn blank() -> Self {
        Self {
            params: poseidon_config().clone(),
            secret_key: None,
            secret_answer: None,
            nullifier_hash: None,
            commitment: None,
            new_owner: None,
            current_owner: None,
        }
    }
}

/// In-circuit FieldHash. Must absorb in the same order as
/// [`super::poseidon::hash_fr`]: arity first, then the inputs.
fn hash_gadget(
    cs: ConstraintSystemRef<Fr>,
    params: &PoseidonConfig<Fr>,
    inputs: &[&FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<Fr>::new(cs, params);
    sponge.absorb(&FpVar::constant(Fr::from(inputs.len() as u64)))?;
    for input in inputs {
        sponge.absorb(*input)?;
    }
    let mut out = sponge.squeeze_field_elements(1)?;
    out.pop().ok_or(SynthesisError::Unsatisfiable)
}

// ---------------------------------------------------------------------------
// Constraint synthesizer
// ---------------------------------------------------------------------------

impl ConstraintSynthesizer<Fr> for RecoveryCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // ===================================================================
        // 1. Public inputs, in verifier order
        // ===================================================================

        let nullifier_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "nullifier_hash"), || {
            self.nullifier_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let commitment_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "commitment"), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let new_owner_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "new_owner"), || {
            self.new_owner.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let current_owner_var =
            FpVar::<Fr>::new_input(ark_relations::ns!(cs, "current_owner"), || {
                self.current_owner.ok_or(SynthesisError::AssignmentMissing)
            })?;

        // ===================================================================
        // 2. Private witnesses
        // ===================================================================

        let key_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "secret_key"), || {
            self.secret_key.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let answer_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "secret_answer"), || {
            self.secret_answer.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ===================================================================
        // 3. Commitment opening: H(sk, sa) == commitment
        // ===================================================================

        let computed_commitment =
            hash_gadget(cs.clone(), &self.params, &[&key_var, &answer_var])?;
        computed_commitment.enforce_equal(&commitment_var)?;

        // ===================================================================
        // 4. Nullifier: H(sk, H(sa), new_owner, current_owner) == nullifier
        // ===================================================================

        let hashed_answer = hash_gadget(cs.clone(), &self.params, &[&answer_var])?;
        let computed_nullifier = hash_gadget(
            cs,
            &self.params,
            &[&key_var, &hashed_answer, &new_owner_var, &current_owner_var],
        )?;
        computed_nullifier.enforce_equal(&nullifier_var)?;

        Ok(())
    }
}

/// Build the public-input vector in the exact order the circuit allocates
/// it. Any divergence here silently breaks every proof.
pub fn public_inputs_fr(
    nullifier_hash: &FieldElement,
    commitment: &FieldElement,
    new_owner: &Address,
    current_owner: &Address,
) -> Vec<Fr> {
    vec![
        nullifier_hash.to_fr(),
        commitment.to_fr(),
        FieldElement::from_address(new_owner).to_fr(),
        FieldElement::from_address(current_owner).to_fr(),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
