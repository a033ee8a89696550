//! # Guardian Secrets and Recovery Statements
//!
//! A guardian holds two field elements and nothing else: a secret key and
//! the encoding of a secret answer. The account stores only the commitment
//! to them. When the owner key is lost, the guardian derives a
//! [`RecoveryStatement`] for one specific `current_owner -> new_owner`
//! transition and proves it in zero knowledge.
//!
//! The secret never leaves this type: `Debug` is redacted and there is no
//! `Serialize` impl.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::field::FieldElement;
use super::poseidon;
use super::verifier::public_inputs;

/// The guardian's private recovery material.
#[derive(Clone, PartialEq, Eq)]
pub struct GuardianSecret {
    secret_key: FieldElement,
    secret_answer: FieldElement,
}

impl GuardianSecret {
    /// Build from already-encoded field elements.
    pub fn new(secret_key: FieldElement, secret_answer: FieldElement) -> Self {
        Self {
            secret_key,
            secret_answer,
        }
    }

    /// Build from a secret key and a plain-text answer (`"mango"`), encoded
    /// with [`FieldElement::from_word`].
    pub fn with_answer(secret_key: FieldElement, answer: &str) -> Self {
        Self::new(secret_key, FieldElement::from_word(answer))
    }

    /// The secret key. Only the prover should need this.
    pub fn secret_key(&self) -> &FieldElement {
        &self.secret_key
    }

    /// The encoded secret answer. Only the prover should need this.
    pub fn secret_answer(&self) -> &FieldElement {
        &self.secret_answer
    }

    /// Commitment the account owner registers.
    pub fn commitment(&self) -> FieldElement {
        poseidon::commitment(&self.secret_key, &self.secret_answer)
    }

    /// Nullifier for the `current_owner -> new_owner` transition.
    pub fn nullifier(&self, new_owner: &Address, current_owner: &Address) -> FieldElement {
        poseidon::nullifier(&self.secret_key, &self.secret_answer, new_owner, current_owner)
    }

    /// Everything public about one recovery, derived from this secret.
    pub fn statement(&self, new_owner: Address, current_owner: Address) -> RecoveryStatement {
        RecoveryStatement {
            nullifier_hash: self.nullifier(&new_owner, &current_owner),
            commitment: self.commitment(),
            new_owner,
            current_owner,
        }
    }
}

impl fmt::Debug for GuardianSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardianSecret")
            .field("commitment", &self.commitment())
            .finish_non_exhaustive()
    }
}

/// The public side of a recovery proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryStatement {
    /// One-time tag for this transition.
    pub nullifier_hash: FieldElement,
    /// Commitment the secret opens.
    pub commitment: FieldElement,
    /// Owner being installed.
    pub new_owner: Address,
    /// Owner being replaced.
    pub current_owner: Address,
}

impl RecoveryStatement {
    /// Public inputs in verifier order.
    pub fn public_inputs(&self) -> [FieldElement; 4] {
        public_inputs(
            &self.nullifier_hash,
            &self.commitment,
            &self.new_owner,
            &self.current_owner,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_matches_free_functions() {
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(1), "mango");
        let new_owner = Address::repeat_byte(2);
        let current_owner = Address::repeat_byte(1);
        let st = secret.statement(new_owner, current_owner);

        assert_eq!(
            st.commitment,
            poseidon::commitment(&FieldElement::from_u64(1), &FieldElement::from_word("mango"))
        );
        assert_eq!(st.nullifier_hash, secret.nullifier(&new_owner, &current_owner));
        assert_eq!(st.public_inputs()[0], st.nullifier_hash);
        assert_eq!(st.public_inputs()[1], st.commitment);
    }

    #[test]
    fn debug_hides_the_secret() {
        let secret = GuardianSecret::with_answer(FieldElement::from_u64(123456789), "mango");
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains(&FieldElement::from_word("mango").to_hex()));
        assert!(!rendered.contains(&FieldElement::from_u64(123456789).to_hex()));
        assert!(rendered.contains("commitment"));
    }
}
