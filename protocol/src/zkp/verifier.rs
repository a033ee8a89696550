//! # Groth16 Proof Verification
//!
//! The verifier side of the recovery proof. Every smart account checks a
//! guardian's proof through the [`ProofVerifier`] seam before it touches
//! the nullifier set or the owner slot.
//!
//! The seam is a trait so that the account logic never learns how proofs
//! are checked: [`RecoveryVerifier`] runs a real Groth16 pairing check,
//! tests plug in scripted verifiers.
//!
//! Groth16 verification is three pairings plus a four-term multi-scalar
//! multiplication, so cost is constant regardless of circuit size.

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;

use super::circuit;
use super::field::FieldElement;
use super::prover::RecoveryProof;

/// Number of public inputs the recovery circuit exposes.
pub const PUBLIC_INPUT_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// ProofVerifier seam
// ---------------------------------------------------------------------------

/// Checks an opaque proof against an ordered list of public inputs.
///
/// Implementations must be pure: the same `(proof, public_inputs)` always
/// yields the same answer, and nothing is mutated. Any failure (malformed
/// bytes, wrong input count, failed pairing) is reported as `false`.
pub trait ProofVerifier: Send + Sync {
    /// `true` iff `proof` is valid for `public_inputs`.
    fn verify(&self, proof: &[u8], public_inputs: &[FieldElement]) -> bool;
}

/// The public-input vector, in circuit order:
/// `[nullifier_hash, commitment, new_owner, current_owner]`.
pub fn public_inputs(
    nullifier_hash: &FieldElement,
    commitment: &FieldElement,
    new_owner: &Address,
    current_owner: &Address,
) -> [FieldElement; PUBLIC_INPUT_COUNT] {
    [
        *nullifier_hash,
        *commitment,
        FieldElement::from_address(new_owner),
        FieldElement::from_address(current_owner),
    ]
}

// ---------------------------------------------------------------------------
// RecoveryVerifier
// ---------------------------------------------------------------------------

/// Holds the Groth16 verification key for the recovery circuit.
///
/// Small (well under 1 KB compressed) and safe to publish.
#[derive(Clone)]
pub struct RecoveryVerifier {
    vk: VerifyingKey<Bn254>,
}

impl RecoveryVerifier {
    /// Construct from an arkworks verification key (called by `RecoveryProver::setup`).
    pub(crate) fn from_vk(vk: VerifyingKey<Bn254>) -> Self {
        Self { vk }
    }

    /// Verify a recovery proof against its public statement.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the proof verifies, `Ok(false)` if it does not, or
    /// `Err(...)` if the inputs are malformed or the verification
    /// algorithm itself fails.
    pub fn verify_proof(
        &self,
        proof: &RecoveryProof,
        public_inputs: &[FieldElement],
    ) -> Result<bool> {
        if public_inputs.len() != PUBLIC_INPUT_COUNT {
            bail!(
                "expected {} public inputs, got {}",
                PUBLIC_INPUT_COUNT,
                public_inputs.len()
            );
        }

        let ark_proof = proof
            .to_ark_proof()
            .context("failed to deserialize proof")?;

        let inputs: Vec<Fr> = public_inputs.iter().map(FieldElement::to_fr).collect();

        let valid = Groth16::<Bn254>::verify(&self.vk, &inputs, &ark_proof)
            .context("Groth16 verification algorithm failed")?;

        Ok(valid)
    }

    /// Convenience wrapper taking the statement fields directly.
    pub fn verify_statement(
        &self,
        proof: &RecoveryProof,
        nullifier_hash: &FieldElement,
        commitment: &FieldElement,
        new_owner: &Address,
        current_owner: &Address,
    ) -> Result<bool> {
        let ark_proof = proof
            .to_ark_proof()
            .context("failed to deserialize proof")?;
        let inputs =
            circuit::public_inputs_fr(nullifier_hash, commitment, new_owner, current_owner);
        Groth16::<Bn254>::verify(&self.vk, &inputs, &ark_proof)
            .context("Groth16 verification algorithm failed")
    }

    /// Serialize the verification key (for publication alongside accounts).
    pub fn vk_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.vk
            .serialize_compressed(&mut buf)
            .context("verification key serialization failed")?;
        Ok(buf)
    }

    /// Deserialize a verification key from bytes.
    pub fn vk_from_bytes(data: &[u8]) -> Result<Self> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(data)
            .context("failed to deserialize verification key")?;
        Ok(Self { vk })
    }
}

impl ProofVerifier for RecoveryVerifier {
    fn verify(&self, proof: &[u8], public_inputs: &[FieldElement]) -> bool {
        let proof = match RecoveryProof::from_bytes(proof) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting malformed recovery proof");
                return false;
            }
        };

        match self.verify_proof(&proof, public_inputs) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "recovery proof verification errored");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::guardian::GuardianSecret;
    use crate::zkp::test_support::keys;

    fn o1() -> Address {
        Address::repeat_byte(0x11)
    }

    fn o2() -> Address {
        Address::repeat_byte(0x22)
    }

    #[test]
    fn verify_valid_proof() {
        let (prover, verifier) = keys();
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(1), "mango");
        let statement = secret.statement(o2(), o1());

        let proof = prover.prove(&secret, &statement).unwrap();
        assert!(verifier.verify_proof(&proof, &statement.public_inputs()).unwrap());
        assert!(ProofVerifier::verify(
            verifier,
            proof.as_bytes(),
            &statement.public_inputs()
        ));
    }

    #[test]
    fn statement_wrapper_agrees_with_slice_api() {
        let (prover, verifier) = keys();
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(4), "plum");
        let st = secret.statement(o2(), o1());
        let proof = prover.prove(&secret, &st).unwrap();

        let ok = verifier
            .verify_statement(&proof, &st.nullifier_hash, &st.commitment, &o2(), &o1())
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn reject_swapped_owners() {
        let (prover, verifier) = keys();
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(1), "mango");
        let statement = secret.statement(o2(), o1());
        let proof = prover.prove(&secret, &statement).unwrap();

        // Same proof presented for a different transition.
        let inputs = public_inputs(&statement.nullifier_hash, &statement.commitment, &o1(), &o2());
        assert!(!verifier.verify_proof(&proof, &inputs).unwrap());
    }

    #[test]
    fn reject_wrong_commitment() {
        let (prover, verifier) = keys();
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(1), "mango");
        let statement = secret.statement(o2(), o1());
        let proof = prover.prove(&secret, &statement).unwrap();

        let other = GuardianSecret::with_answer(FieldElement::from_u64(1), "papaya").commitment();
        let inputs = public_inputs(&statement.nullifier_hash, &other, &o2(), &o1());
        assert!(!verifier.verify_proof(&proof, &inputs).unwrap());
    }

    #[test]
    fn wrong_input_count_is_an_error_and_false_via_trait() {
        let (prover, verifier) = keys();
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(1), "mango");
        let statement = secret.statement(o2(), o1());
        let proof = prover.prove(&secret, &statement).unwrap();

        let short = &statement.public_inputs()[..3];
        assert!(verifier.verify_proof(&proof, short).is_err());
        assert!(!ProofVerifier::verify(verifier, proof.as_bytes(), short));
    }

    #[test]
    fn garbage_bytes_are_false() {
        let (_prover, verifier) = keys();
        let inputs = [FieldElement::zero(); PUBLIC_INPUT_COUNT];
        assert!(!ProofVerifier::verify(verifier, &[], &inputs));
        assert!(!ProofVerifier::verify(verifier, &[0xab; 128], &inputs));
    }

    #[test]
    fn vk_round_trip() {
        let (prover, verifier) = keys();
        let restored = RecoveryVerifier::vk_from_bytes(&verifier.vk_to_bytes().unwrap()).unwrap();

        let secret = GuardianSecret::with_answer(FieldElement::from_u64(8), "date");
        let statement = secret.statement(o2(), o1());
        let proof = prover.prove(&secret, &statement).unwrap();
        assert!(restored.verify_proof(&proof, &statement.public_inputs()).unwrap());
    }

    #[test]
    fn public_input_helpers_agree() {
        let n = FieldElement::from_u64(1);
        let c = FieldElement::from_u64(2);
        let ours: Vec<Fr> = public_inputs(&n, &c, &o2(), &o1())
            .iter()
            .map(FieldElement::to_fr)
            .collect();
        assert_eq!(ours, circuit::public_inputs_fr(&n, &c, &o2(), &o1()));
    }
}
