//! # Recovery Coordinator
//!
//! The one place ownership changes hands without the owner's key. A
//! recovery request is checked against the account's configured
//! [`RecoveryMode`] and, if every check passes, the owner slot is rewritten.
//!
//! ## ZK path
//!
//! 1. `new_owner != 0`, and the account is in `ZkCommitment` mode.
//! 2. `request.current_owner` equals the owner on record. The nullifier is
//!    bound to the owner it replaces, so a proof minted before an earlier
//!    recovery is stale by construction.
//! 3. The nullifier has not been consumed by this account.
//! 4. The proof verifies against `[nullifier, commitment, new_owner, current_owner]`.
//! 5. The nullifier is consumed and the owner replaced in the same step.
//!
//! ## Signature path
//!
//! 1. `new_owner != 0`, and the account is in `Signature` mode.
//! 2. `request.nonce` equals the account's recovery nonce.
//! 3. The EIP-712 `Recover(currentOwner, newOwner, nonce)` digest under the
//!    account's domain recovers to the guardian.
//! 4. The owner is replaced and the recovery nonce incremented.
//!
//! Every check happens before any write, so a failed request leaves the
//! ledger exactly as it found it.

use std::sync::Arc;

use aegis_protocol::crypto::{smart_account_domain, Recover, RecoverableSignature};
use aegis_protocol::storage::{AccountState, Ledger, RecoveryMode};
use aegis_protocol::zkp::{public_inputs, FieldElement, ProofVerifier};
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolStruct;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a recovery request is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    /// No smart account exists at the address.
    #[error("unknown account {account}")]
    UnknownAccount {
        /// The address that was looked up.
        account: Address,
    },

    /// The proposed owner is the zero address.
    #[error("new owner must be non-zero")]
    ZeroNewOwner,

    /// A ZK request arrived but the account has no commitment on record.
    #[error("account has no guardian commitment")]
    CommitmentNotSet,

    /// A signature request arrived but the account has no guardian address.
    #[error("account has no guardian address")]
    GuardianNotSet,

    /// The request names an owner that is no longer current.
    #[error("stale request: account owner is {expected}, request names {provided}")]
    StaleOwnerMismatch {
        /// The owner on record.
        expected: Address,
        /// The owner the request was built for.
        provided: Address,
    },

    /// The nullifier was already consumed by this account.
    #[error("nullifier {nullifier} already used")]
    NullifierReused {
        /// The replayed nullifier.
        nullifier: FieldElement,
    },

    /// The proof did not verify for the account's public inputs.
    #[error("recovery proof rejected")]
    InvalidProof,

    /// The guardian signed for a different recovery nonce.
    #[error("recovery nonce mismatch: expected {expected}, got {provided}")]
    NonceMismatch {
        /// The account's current recovery nonce.
        expected: U256,
        /// The nonce in the request.
        provided: U256,
    },

    /// The signature does not recover to the guardian.
    #[error("guardian signature rejected")]
    InvalidSignature,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A guardian's request to replace an account's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryRequest {
    /// Knowledge-of-secret recovery.
    ZkProof {
        /// Owner to install.
        new_owner: Address,
        /// Owner the proof was generated against.
        current_owner: Address,
        /// One-time tag for this transition.
        nullifier_hash: FieldElement,
        /// Opaque proof bytes handed to the verifier.
        proof: Vec<u8>,
    },
    /// Guardian-key recovery.
    Signature {
        /// Owner to install.
        new_owner: Address,
        /// Recovery nonce the guardian signed.
        nonce: U256,
        /// 65-byte `r || s || v` over the EIP-712 `Recover` digest.
        signature: RecoverableSignature,
    },
}

impl RecoveryRequest {
    /// The owner this request would install.
    pub fn new_owner(&self) -> Address {
        match self {
            RecoveryRequest::ZkProof { new_owner, .. }
            | RecoveryRequest::Signature { new_owner, .. } => *new_owner,
        }
    }

    fn method(&self) -> &'static str {
        match self {
            RecoveryRequest::ZkProof { .. } => "zk",
            RecoveryRequest::Signature { .. } => "signature",
        }
    }
}

/// What a successful recovery changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recovered {
    /// The owner that was replaced.
    pub previous_owner: Address,
    /// The owner now in control.
    pub new_owner: Address,
}

/// The EIP-712 digest a signature-mode guardian signs.
pub fn recovery_digest(
    chain_id: u64,
    account: Address,
    current_owner: Address,
    new_owner: Address,
    nonce: U256,
) -> B256 {
    let domain = smart_account_domain(chain_id, account);
    Recover {
        currentOwner: current_owner,
        newOwner: new_owner,
        nonce,
    }
    .eip712_signing_hash(&domain)
}

// ---------------------------------------------------------------------------
// RecoveryCoordinator
// ---------------------------------------------------------------------------

/// Validates and applies recovery requests.
#[derive(Clone)]
pub struct RecoveryCoordinator {
    verifier: Arc<dyn ProofVerifier>,
    chain_id: u64,
}

impl RecoveryCoordinator {
    /// Build a coordinator that checks proofs with `verifier` and signs
    /// EIP-712 domains for `chain_id`.
    pub fn new(verifier: Arc<dyn ProofVerifier>, chain_id: u64) -> Self {
        Self { verifier, chain_id }
    }

    /// Chain id used for EIP-712 domains.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Apply `request` to `account`, or refuse it without touching `ledger`.
    pub fn recover(
        &self,
        ledger: &mut Ledger,
        account: Address,
        request: &RecoveryRequest,
    ) -> Result<Recovered, RecoveryError> {
        let result = self.apply(ledger, account, request);
        match &result {
            Ok(done) => tracing::info!(
                %account,
                method = request.method(),
                previous_owner = %done.previous_owner,
                new_owner = %done.new_owner,
                "account recovered"
            ),
            Err(e) => tracing::warn!(
                %account,
                method = request.method(),
                error = %e,
                "recovery refused"
            ),
        }
        result
    }

    fn apply(
        &self,
        ledger: &mut Ledger,
        account: Address,
        request: &RecoveryRequest,
    ) -> Result<Recovered, RecoveryError> {
        if request.new_owner() == Address::ZERO {
            return Err(RecoveryError::ZeroNewOwner);
        }

        let state = ledger
            .account(&account)
            .ok_or(RecoveryError::UnknownAccount { account })?;
        let previous_owner = state.owner;

        match request {
            RecoveryRequest::ZkProof {
                new_owner,
                current_owner,
                nullifier_hash,
                proof,
            } => {
                self.check_proof(
                    ledger,
                    account,
                    state,
                    *new_owner,
                    *current_owner,
                    nullifier_hash,
                    proof,
                )?;

                // Consume and rotate together.
                ledger.consume_nullifier(account, *nullifier_hash);
                if let Some(state) = ledger.account_mut(&account) {
                    state.owner = *new_owner;
                }
            }
            RecoveryRequest::Signature {
                new_owner,
                nonce,
                signature,
            } => {
                self.check_signature(account, state, *new_owner, *nonce, signature)?;

                if let Some(state) = ledger.account_mut(&account) {
                    state.owner = *new_owner;
                    state.recovery_nonce += U256::from(1u64);
                }
            }
        }

        Ok(Recovered {
            previous_owner,
            new_owner: request.new_owner(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn check_proof(
        &self,
        ledger: &Ledger,
        account: Address,
        state: &AccountState,
        new_owner: Address,
        current_owner: Address,
        nullifier_hash: &FieldElement,
        proof: &[u8],
    ) -> Result<(), RecoveryError> {
        let commitment = match state.recovery_mode {
            Some(RecoveryMode::ZkCommitment { commitment }) => commitment,
            _ => return Err(RecoveryError::CommitmentNotSet),
        };

        if current_owner != state.owner {
            return Err(RecoveryError::StaleOwnerMismatch {
                expected: state.owner,
                provided: current_owner,
            });
        }

        if ledger.nullifiers().contains(&account, nullifier_hash) {
            return Err(RecoveryError::NullifierReused {
                nullifier: *nullifier_hash,
            });
        }

        let inputs = public_inputs(nullifier_hash, &commitment, &new_owner, &current_owner);
        if !self.verifier.verify(proof, &inputs) {
            return Err(RecoveryError::InvalidProof);
        }
        Ok(())
    }

    fn check_signature(
        &self,
        account: Address,
        state: &AccountState,
        new_owner: Address,
        nonce: U256,
        signature: &RecoverableSignature,
    ) -> Result<(), RecoveryError> {
        let guardian = state.guardian().ok_or(RecoveryError::GuardianNotSet)?;

        if nonce != state.recovery_nonce {
            return Err(RecoveryError::NonceMismatch {
                expected: state.recovery_nonce,
                provided: nonce,
            });
        }

        let digest = recovery_digest(self.chain_id, account, state.owner, new_owner, nonce);
        match signature.recover(&digest) {
            Ok(signer) if signer == guardian => Ok(()),
            _ => Err(RecoveryError::InvalidSignature),
        }
    }
}

impl std::fmt::Debug for RecoveryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryCoordinator")
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
