//! # Zero-Knowledge Recovery Module
//!
//! Implements the guardian side of account recovery using Groth16 over
//! BN254. A guardian commits to `(secret_key, secret_answer)` once; later,
//! to move an account from `current_owner` to `new_owner`, they prove
//! knowledge of the opening together with a transition-bound nullifier,
//! revealing neither secret.
//!
//! ## Architecture
//!
//! ```text
//! field.rs      FieldElement: BN254 scalar plus its byte/address/word encodings
//! poseidon.rs   FieldHash (Poseidon sponge), commitment and nullifier
//! guardian.rs   GuardianSecret, RecoveryStatement
//! circuit.rs    R1CS arithmetic circuit (RecoveryCircuit)
//! prover.rs     Groth16 proof generation (RecoveryProver, RecoveryProof)
//! verifier.rs   ProofVerifier seam and the Groth16 RecoveryVerifier
//! ```
//!
//! ## Security Model
//!
//! - **Commitment hiding/binding**: rests on Poseidon's preimage and
//!   collision resistance over `Fr`.
//! - **Nullifier uniqueness**: one per `(secret, new_owner, current_owner)`;
//!   accounts refuse a nullifier they have already consumed.
//! - **Soundness**: Groth16 knowledge-soundness in the generic group model.
//!
//! The trusted setup is per-circuit. In production, replace the local
//! ceremony with an MPC-generated SRS (see `prover::RecoveryProver::setup`).

pub mod circuit;
pub mod field;
pub mod guardian;
pub mod poseidon;
pub mod prover;
pub mod verifier;

// Re-export the public API so callers can do `use aegis_protocol::zkp::*`.
pub use circuit::RecoveryCircuit;
pub use field::{FieldElement, FieldError};
pub use guardian::{GuardianSecret, RecoveryStatement};
pub use prover::{RecoveryProof, RecoveryProver};
pub use verifier::{public_inputs, ProofVerifier, RecoveryVerifier, PUBLIC_INPUT_COUNT};

/// Shared Groth16 keys for unit tests. Setup takes seconds, so every test
/// in the crate reuses one ceremony.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::OnceLock;

    use ark_std::rand::{rngs::StdRng, SeedableRng};

    use super::{RecoveryProver, RecoveryVerifier};

    pub(crate) fn keys() -> &'static (RecoveryProver, RecoveryVerifier) {
        static KEYS: OnceLock<(RecoveryProver, RecoveryVerifier)> = OnceLock::new();
        KEYS.get_or_init(|| {
            let mut rng = StdRng::seed_from_u64(42);
            RecoveryProver::setup(&mut rng).expect("recovery setup")
        })
    }
}
