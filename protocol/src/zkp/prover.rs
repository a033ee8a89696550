//! # Groth16 Proof Generation
//!
//! This module wraps `ark-groth16` to provide a high-level API for
//! guardians generating recovery proofs. The workflow is:
//!
//! 1. **Setup**: Run `RecoveryProver::setup(rng)` once. This produces a
//!    proving key and a verification key (returned as `RecoveryVerifier`).
//!    In production, replace this with an MPC ceremony.
//!
//! 2. **Prove**: Call `RecoveryProver::prove(secret, statement)`. Internally
//!    this populates a [`RecoveryCircuit`] and invokes `Groth16::prove`.
//!
//! 3. The resulting [`RecoveryProof`] is a compact (128 bytes compressed)
//!    blob that travels with the recovery request. The account never sees
//!    anything else from the guardian.

use anyhow::{bail, Context, Result};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, Rng};

use super::circuit::RecoveryCircuit;
use super::guardian::{GuardianSecret, RecoveryStatement};
use super::verifier::RecoveryVerifier;

// ---------------------------------------------------------------------------
// RecoveryProver
// ---------------------------------------------------------------------------

/// Holds the Groth16 proving key for the recovery circuit.
///
/// Large but immutable; load it once and keep it around.
pub struct RecoveryProver {
    pk: ProvingKey<Bn254>,
}

impl RecoveryProver {
    /// Run the Groth16 trusted setup for the recovery circuit.
    ///
    /// Returns both halves. The verifier is what accounts check proofs
    /// with; the prover stays with guardians.
    pub fn setup<R: Rng + CryptoRng>(rng: &mut R) -> Result<(Self, RecoveryVerifier)> {
        let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(RecoveryCircuit::blank(), rng)
            .context("Groth16 setup failed for the recovery circuit")?;

        Ok((Self { pk }, RecoveryVerifier::from_vk(vk)))
    }

    /// Generate a recovery proof.
    ///
    /// # Errors
    ///
    /// Returns an error if `secret` does not open `statement` (wrong answer,
    /// wrong key, or a statement for different owners), or if proving or
    /// serialization fails.
    pub fn prove(
        &self,
        secret: &GuardianSecret,
        statement: &RecoveryStatement,
    ) -> Result<RecoveryProof> {
        let circuit = RecoveryCircuit::new(secret, statement);

        // ark-groth16 0.4 panics on an unsatisfiable witness instead of
        // returning Err, so check satisfiability first.
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit
            .clone()
            .generate_constraints(cs.clone())
            .context("recovery circuit synthesis failed")?;
        if !cs.is_satisfied().context("constraint check failed")? {
            bail!("guardian secret does not satisfy the recovery statement");
        }

        let mut rng = ark_std::rand::thread_rng();
        let proof = Groth16::<Bn254>::prove(&self.pk, circuit, &mut rng)
            .context("Groth16 proof generation failed")?;

        let mut proof_bytes = Vec::new();
        proof
            .serialize_compressed(&mut proof_bytes)
            .context("proof serialization failed")?;

        tracing::debug!(
            nullifier = %statement.nullifier_hash,
            size = proof_bytes.len(),
            "recovery proof generated"
        );

        Ok(RecoveryProof { bytes: proof_bytes })
    }

    /// Serialize the proving key (for distribution to guardians).
    pub fn pk_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.pk
            .serialize_compressed(&mut buf)
            .context("proving key serialization failed")?;
        Ok(buf)
    }

    /// Deserialize a proving key.
    pub fn pk_from_bytes(data: &[u8]) -> Result<Self> {
        let pk = ProvingKey::<Bn254>::deserialize_compressed(data)
            .context("failed to deserialize proving key")?;
        Ok(Self { pk })
    }
}

// ---------------------------------------------------------------------------
// RecoveryProof
// ---------------------------------------------------------------------------

/// A serialized Groth16 proof for a recovery statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryProof {
    bytes: Vec<u8>,
}

impl RecoveryProof {
    /// Raw compressed proof bytes (the opaque blob accounts receive).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Reconstruct a proof from compressed bytes, validating the encoding.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let _proof = ark_groth16::Proof::<Bn254>::deserialize_compressed(data)
            .context("invalid Groth16 proof bytes")?;

        Ok(Self {
            bytes: data.to_vec(),
        })
    }

    /// Deserialize into the arkworks proof struct.
    pub(crate) fn to_ark_proof(&self) -> Result<ark_groth16::Proof<Bn254>> {
        ark_groth16::Proof::<Bn254>::deserialize_compressed(&self.bytes[..])
            .map_err(|e| anyhow::anyhow!("proof deserialization failed: {}", e))
    }

    /// Size of the proof in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::field::FieldElement;
    use crate::zkp::test_support::keys;
    use alloy_primitives::Address;

    fn statement_for(secret: &GuardianSecret) -> RecoveryStatement {
        secret.statement(Address::repeat_byte(2), Address::repeat_byte(1))
    }

    #[test]
    fn prove_valid_secret() {
        let (prover, _verifier) = keys();
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(1), "mango");

        let proof = prover.prove(&secret, &statement_for(&secret)).unwrap();
        // Compressed Groth16 proofs on BN254: 2 x G1 (32) + 1 x G2 (64).
        assert_eq!(proof.size(), 128);
    }

    #[test]
    fn wrong_secret_is_refused_without_panicking() {
        let (prover, _verifier) = keys();
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(1), "mango");
        let statement = statement_for(&secret);

        let impostor = GuardianSecret::with_answer(FieldElement::from_u64(2), "mango");
        let err = prover.prove(&impostor, &statement).unwrap_err();
        assert!(err.to_string().contains("does not satisfy"));
    }

    #[test]
    fn proof_bytes_round_trip() {
        let (prover, _verifier) = keys();
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(5), "lychee");

        let proof = prover.prove(&secret, &statement_for(&secret)).unwrap();
        let restored = RecoveryProof::from_bytes(&proof.to_bytes()).unwrap();
        assert_eq!(proof, restored);
    }

    #[test]
    fn garbage_proof_bytes_rejected() {
        assert!(RecoveryProof::from_bytes(&[0xffu8; 128]).is_err());
        assert!(RecoveryProof::from_bytes(&[]).is_err());
    }

    #[test]
    fn proving_key_round_trip() {
        let (prover, _verifier) = keys();
        let bytes = prover.pk_to_bytes().unwrap();
        let restored = RecoveryProver::pk_from_bytes(&bytes).unwrap();

        let secret = GuardianSecret::with_answer(FieldElement::from_u64(3), "fig");
        assert!(restored.prove(&secret, &statement_for(&secret)).is_ok());
    }
}
