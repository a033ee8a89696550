//! # Smart Account
//!
//! The executor behind every account address. Call data arriving at an
//! account is decoded against a fixed set of Solidity selectors:
//!
//! | function | who may call |
//! |----------|--------------|
//! | `execute(address,uint256,bytes)` | owner, entry point, the account itself |
//! | `setGuardianCommitment(bytes32)` | owner, entry point, the account itself |
//! | `setGuardianAddress(address)` | owner, entry point, the account itself |
//! | `clearGuardian()` | owner, entry point, the account itself |
//! | `recoverWithProof(address,address,bytes32,bytes)` | anyone |
//! | `recoverWithSignature(address,uint256,bytes)` | anyone |
//!
//! The entry point only forwards operations it has already validated against
//! the owner's signature, which is why it shares the owner's authority. A
//! self-call (`execute(self, 0, setGuardian...)`) likewise acts as the owner.
//!
//! `execute` into another smart account dispatches the inner data there with
//! the calling account as `caller`; into any other address it is a plain
//! value transfer. Empty call data is accepted and does nothing beyond the
//! base charge.
//!
//! ## Gas
//!
//! There is no EVM, so cost follows the flat schedule in
//! `aegis_protocol::config`. A [`GasMeter`] is charged as the call proceeds;
//! running past its limit reverts with [`ExecutionError::OutOfGas`].
//!
//! ## Atomicity
//!
//! A call either completes or leaves the ledger exactly as it found it.

use aegis_protocol::config::{
    CALLDATA_BYTE_GAS, EXECUTION_BASE_GAS, GUARDIAN_UPDATE_GAS, PROOF_RECOVERY_GAS,
    SIGNATURE_RECOVERY_GAS, VALUE_TRANSFER_GAS,
};
use aegis_protocol::crypto::RecoverableSignature;
use aegis_protocol::storage::{Ledger, LedgerError};
use aegis_protocol::zkp::FieldElement;
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolCall};
use thiserror::Error;

use crate::recovery::{RecoveryCoordinator, RecoveryError, RecoveryRequest};
use crate::registry::{self, RegistryError};

sol! {
    function execute(address dest, uint256 value, bytes func) external;
    function setGuardianCommitment(bytes32 commitment) external;
    function setGuardianAddress(address guardian) external;
    function clearGuardian() external;
    function recoverWithProof(
        address newOwner,
        address currentOwner,
        bytes32 nullifierHash,
        bytes proof
    ) external;
    function recoverWithSignature(address newOwner, uint256 nonce, bytes signature) external;
}

/// Nested account-to-account calls deeper than this revert.
pub const MAX_CALL_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a call into an account reverted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Generic revert with a reason string.
    #[error("execution reverted: {reason}")]
    Reverted {
        /// Human-readable reason.
        reason: String,
    },

    /// The gas meter ran dry.
    #[error("out of gas: limit {limit}, needed {needed}")]
    OutOfGas {
        /// The meter's limit.
        limit: u128,
        /// Gas that would have been used.
        needed: u128,
    },

    /// The account cannot cover the value it tried to send.
    #[error("insufficient balance: have {available}, need {needed}")]
    InsufficientBalance {
        /// Value requested.
        needed: U256,
        /// Value held.
        available: U256,
    },

    /// The caller may not invoke this function on this account.
    #[error("caller {caller} is not authorized on {account}")]
    Unauthorized {
        /// The account being called.
        account: Address,
        /// Who called.
        caller: Address,
    },

    /// A recovery call was refused.
    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    /// A guardian-configuration call was refused.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The selector matches no account function.
    #[error("unknown function selector 0x{}", hex::encode(.selector))]
    UnknownFunction {
        /// The first four bytes of the call data.
        selector: [u8; 4],
    },

    /// The arguments did not decode.
    #[error("malformed call data: {reason}")]
    MalformedCalldata {
        /// Decoder message.
        reason: String,
    },
}

impl From<alloy_sol_types::Error> for ExecutionError {
    fn from(e: alloy_sol_types::Error) -> Self {
        ExecutionError::MalformedCalldata {
            reason: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// GasMeter
// ---------------------------------------------------------------------------

/// Tracks gas consumed against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMeter {
    limit: u128,
    used: u128,
}

impl GasMeter {
    /// A meter allowing up to `limit` gas.
    pub fn new(limit: u128) -> Self {
        Self { limit, used: 0 }
    }

    /// A meter that never runs out, for direct owner calls.
    pub fn unlimited() -> Self {
        Self::new(u128::MAX)
    }

    /// Consume `amount`. On failure the meter is left fully spent.
    pub fn charge(&mut self, amount: u128) -> Result<(), ExecutionError> {
        let needed = self.used.saturating_add(amount);
        if needed > self.limit {
            self.used = self.limit;
            return Err(ExecutionError::OutOfGas {
                limit: self.limit,
                needed,
            });
        }
        self.used = needed;
        Ok(())
    }

    /// Gas consumed so far.
    pub fn used(&self) -> u128 {
        self.used
    }

    /// Gas still available.
    pub fn remaining(&self) -> u128 {
        self.limit - self.used
    }
}

// ---------------------------------------------------------------------------
// AccountCall
// ---------------------------------------------------------------------------

/// A decoded call into a smart account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCall {
    /// Send `value` to `target` and, if it is an account, run `data` there.
    Execute {
        /// Destination.
        target: Address,
        /// Native value to move.
        value: U256,
        /// Inner call data.
        data: Vec<u8>,
    },
    /// Switch to ZK recovery with this commitment.
    SetGuardianCommitment {
        /// `FieldHash(secret_key, secret_answer)`.
        commitment: FieldElement,
    },
    /// Switch to signature recovery with this guardian.
    SetGuardianAddress {
        /// Guardian key address.
        guardian: Address,
    },
    /// Make the account unrecoverable.
    ClearGuardian,
    /// Recover the account with a guardian request.
    Recover(RecoveryRequest),
}

impl AccountCall {
    /// Decode call data.
    pub fn decode(data: &[u8]) -> Result<Self, ExecutionError> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ExecutionError::MalformedCalldata {
                reason: "call data shorter than a 4-byte selector".to_string(),
            })?;

        if selector == executeCall::SELECTOR {
            let call = executeCall::abi_decode(data, true)?;
            Ok(AccountCall::Execute {
                target: call.dest,
                value: call.value,
                data: call.func.to_vec(),
            })
        } else if selector == setGuardianCommitmentCall::SELECTOR {
            let call = setGuardianCommitmentCall::abi_decode(data, true)?;
            Ok(AccountCall::SetGuardianCommitment {
                commitment: field_word(&call.commitment)?,
            })
        } else if selector == setGuardianAddressCall::SELECTOR {
            let call = setGuardianAddressCall::abi_decode(data, true)?;
            Ok(AccountCall::SetGuardianAddress {
                guardian: call.guardian,
            })
        } else if selector == clearGuardianCall::SELECTOR {
            clearGuardianCall::abi_decode(data, true)?;
            Ok(AccountCall::ClearGuardian)
        } else if selector == recoverWithProofCall::SELECTOR {
            let call = recoverWithProofCall::abi_decode(data, true)?;
            Ok(AccountCall::Recover(RecoveryRequest::ZkProof {
                new_owner: call.newOwner,
                current_owner: call.currentOwner,
                nullifier_hash: field_word(&call.nullifierHash)?,
                proof: call.proof.to_vec(),
            }))
        } else if selector == recoverWithSignatureCall::SELECTOR {
            let call = recoverWithSignatureCall::abi_decode(data, true)?;
            let signature = RecoverableSignature::from_slice(&call.signature)
                .map_err(|_| RecoveryError::InvalidSignature)?;
            Ok(AccountCall::Recover(RecoveryRequest::Signature {
                new_owner: call.newOwner,
                nonce: call.nonce,
                signature,
            }))
        } else {
            Err(ExecutionError::UnknownFunction { selector })
        }
    }

    /// Encode as call data.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            AccountCall::Execute {
                target,
                value,
                data,
            } => executeCall {
                dest: *target,
                value: *value,
                func: data.clone().into(),
            }
            .abi_encode(),
            AccountCall::SetGuardianCommitment { commitment } => setGuardianCommitmentCall {
                commitment: commitment.to_b256(),
            }
            .abi_encode(),
            AccountCall::SetGuardianAddress { guardian } => setGuardianAddressCall {
                guardian: *guardian,
            }
            .abi_encode(),
            AccountCall::ClearGuardian => clearGuardianCall {}.abi_encode(),
            AccountCall::Recover(RecoveryRequest::ZkProof {
                new_owner,
                current_owner,
                nullifier_hash,
                proof,
            }) => recoverWithProofCall {
                newOwner: *new_owner,
                currentOwner: *current_owner,
                nullifierHash: nullifier_hash.to_b256(),
                proof: proof.clone().into(),
            }
            .abi_encode(),
            AccountCall::Recover(RecoveryRequest::Signature {
                new_owner,
                nonce,
                signature,
            }) => recoverWithSignatureCall {
                newOwner: *new_owner,
                nonce: *nonce,
                signature: signature.to_vec().into(),
            }
            .abi_encode(),
        }
    }

    /// Recovery calls are open to anyone; everything else needs the owner.
    fn is_permissionless(&self) -> bool {
        matches!(self, AccountCall::Recover(_))
    }
}

/// A `bytes32` argument read as a field element.
fn field_word(word: &B256) -> Result<FieldElement, ExecutionError> {
    FieldElement::from_b256(word).map_err(|e| ExecutionError::MalformedCalldata {
        reason: e.to_string(),
    })
}

/// Convenience: `execute(target, value, data)` call data.
pub fn encode_execute(target: Address, value: U256, data: Vec<u8>) -> Vec<u8> {
    AccountCall::Execute {
        target,
        value,
        data,
    }
    .encode()
}

// ---------------------------------------------------------------------------
// SmartAccount
// ---------------------------------------------------------------------------

/// Executes calls against smart accounts held in a [`Ledger`].
#[derive(Debug, Clone)]
pub struct SmartAccount {
    coordinator: RecoveryCoordinator,
    entry_point: Address,
}

impl SmartAccount {
    /// An executor that trusts `entry_point` with owner authority and routes
    /// recovery calls through `coordinator`.
    pub fn new(coordinator: RecoveryCoordinator, entry_point: Address) -> Self {
        Self {
            coordinator,
            entry_point,
        }
    }

    /// The recovery coordinator used for `recoverWith*` calls.
    pub fn coordinator(&self) -> &RecoveryCoordinator {
        &self.coordinator
    }

    /// Direct call into `account` by `caller`, without a gas limit.
    pub fn execute(
        &self,
        ledger: &mut Ledger,
        account: Address,
        caller: Address,
        call_data: &[u8],
    ) -> Result<(), ExecutionError> {
        let mut meter = GasMeter::unlimited();
        self.execute_metered(ledger, account, caller, call_data, &mut meter)
    }

    /// Call into `account` by `caller`, charging `meter`.
    ///
    /// On error every change made by the call is rolled back; the meter
    /// keeps whatever was charged.
    pub fn execute_metered(
        &self,
        ledger: &mut Ledger,
        account: Address,
        caller: Address,
        call_data: &[u8],
        meter: &mut GasMeter,
    ) -> Result<(), ExecutionError> {
        let checkpoint = ledger.checkpoint();
        let result = self.dispatch(ledger, account, caller, call_data, meter, 0);
        match &result {
            Ok(()) => ledger.commit(checkpoint),
            Err(e) => {
                ledger.revert_to(checkpoint);
                tracing::debug!(%account, %caller, error = %e, "account call reverted");
            }
        }
        result
    }

    fn dispatch(
        &self,
        ledger: &mut Ledger,
        account: Address,
        caller: Address,
        call_data: &[u8],
        meter: &mut GasMeter,
        depth: usize,
    ) -> Result<(), ExecutionError> {
        if depth > MAX_CALL_DEPTH {
            return Err(ExecutionError::Reverted {
                reason: "call depth exceeded".to_string(),
            });
        }

        let calldata_gas = CALLDATA_BYTE_GAS.saturating_mul(call_data.len() as u128);
        meter.charge(EXECUTION_BASE_GAS.saturating_add(calldata_gas))?;

        let owner = ledger
            .account(&account)
            .map(|state| state.owner)
            .ok_or_else(|| ExecutionError::Reverted {
                reason: format!("no account at {}", account),
            })?;

        // Nothing to call, as in a deploy-only user operation.
        if call_data.is_empty() {
            return Ok(());
        }

        let call = AccountCall::decode(call_data)?;

        // Registry checks compare against the owner, so privileged callers
        // act under the owner's identity.
        let acting_as = if caller == owner || caller == self.entry_point || caller == account {
            owner
        } else if call.is_permissionless() {
            caller
        } else {
            return Err(ExecutionError::Unauthorized { account, caller });
        };

        match call {
            AccountCall::Execute {
                target,
                value,
                data,
            } => {
                if !value.is_zero() {
                    meter.charge(VALUE_TRANSFER_GAS)?;
                    transfer(ledger, account, target, value)?;
                }
                if ledger.is_account(&target) && !data.is_empty() {
                    self.dispatch(ledger, target, account, &data, meter, depth + 1)?;
                }
                Ok(())
            }
            AccountCall::SetGuardianCommitment { commitment } => {
                meter.charge(GUARDIAN_UPDATE_GAS)?;
                registry::set_guardian_commitment(ledger, account, acting_as, commitment)?;
                Ok(())
            }
            AccountCall::SetGuardianAddress { guardian } => {
                meter.charge(GUARDIAN_UPDATE_GAS)?;
                registry::set_guardian_address(ledger, account, acting_as, guardian)?;
                Ok(())
            }
            AccountCall::ClearGuardian => {
                meter.charge(GUARDIAN_UPDATE_GAS)?;
                registry::clear_guardian(ledger, account, acting_as)?;
                Ok(())
            }
            AccountCall::Recover(request) => {
                let cost = match request {
                    RecoveryRequest::ZkProof { .. } => PROOF_RECOVERY_GAS,
                    RecoveryRequest::Signature { .. } => SIGNATURE_RECOVERY_GAS,
                };
                meter.charge(cost)?;
                self.coordinator.recover(ledger, account, &request)?;
                Ok(())
            }
        }
    }
}

fn transfer(
    ledger: &mut Ledger,
    from: Address,
    to: Address,
    value: U256,
) -> Result<(), ExecutionError> {
    ledger.debit(from, value).map_err(|e| match e {
        LedgerError::InsufficientFunds {
            needed, available, ..
        } => ExecutionError::InsufficientBalance { needed, available },
        other => ExecutionError::Reverted {
            reason: other.to_string(),
        },
    })?;
    ledger.credit(to, value).map_err(|e| ExecutionError::Reverted {
        reason: e.to_string(),
    })?;
    tracing::debug!(%from, %to, %value, "value transferred");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_protocol::storage::AccountState;
    use aegis_protocol::zkp::ProofVerifier;
    use std::sync::Arc;

    const ACCOUNT: Address = Address::repeat_byte(0xaa);
    const OTHER_ACCOUNT: Address = Address::repeat_byte(0xab);
    const OWNER: Address = Address::repeat_byte(0x01);
    const ENTRY_POINT: Address = Address::repeat_byte(0xee);
    const STRANGER: Address = Address::repeat_byte(0x66);

    struct RejectAll;

    impl ProofVerifier for RejectAll {
        fn verify(&self, _proof: &[u8], _inputs: &[FieldElement]) -> bool {
            false
        }
    }

    fn setup() -> (SmartAccount, Ledger) {
        let coordinator = RecoveryCoordinator::new(Arc::new(RejectAll), 31337);
        let executor = SmartAccount::new(coordinator, ENTRY_POINT);
        let mut ledger = Ledger::new();
        ledger.insert_account(ACCOUNT, AccountState::new(OWNER));
        ledger.insert_account(OTHER_ACCOUNT, AccountState::new(STRANGER));
        ledger.credit(ACCOUNT, U256::from(1_000u64)).unwrap();
        (executor, ledger)
    }

    #[test]
    fn selectors_match_solidity() {
        assert_eq!(hex::encode(executeCall::SELECTOR), "b61d27f6");
        assert_eq!(
            executeCall::SIGNATURE,
            "execute(address,uint256,bytes)"
        );
        assert_eq!(
            recoverWithProofCall::SIGNATURE,
            "recoverWithProof(address,address,bytes32,bytes)"
        );
        let unique: std::collections::BTreeSet<[u8; 4]> = [
            executeCall::SELECTOR,
            setGuardianCommitmentCall::SELECTOR,
            setGuardianAddressCall::SELECTOR,
            clearGuardianCall::SELECTOR,
            recoverWithProofCall::SELECTOR,
            recoverWithSignatureCall::SELECTOR,
        ]
        .into_iter()
        .collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn calls_round_trip_through_calldata() {
        let calls = vec![
            AccountCall::Execute {
                target: STRANGER,
                value: U256::from(5u64),
                data: vec![1, 2, 3],
            },
            AccountCall::SetGuardianCommitment {
                commitment: FieldElement::from_word("mango"),
            },
            AccountCall::SetGuardianAddress { guardian: STRANGER },
            AccountCall::ClearGuardian,
            AccountCall::Recover(RecoveryRequest::ZkProof {
                new_owner: STRANGER,
                current_owner: OWNER,
                nullifier_hash: FieldElement::from_u64(3),
                proof: vec![9; 40],
            }),
        ];
        for call in calls {
            assert_eq!(AccountCall::decode(&call.encode()).unwrap(), call);
        }
    }

    #[test]
    fn owner_transfers_value() {
        let (executor, mut ledger) = setup();
        let data = encode_execute(STRANGER, U256::from(300u64), vec![]);
        executor.execute(&mut ledger, ACCOUNT, OWNER, &data).unwrap();

        assert_eq!(ledger.balance(&ACCOUNT), U256::from(700u64));
        assert_eq!(ledger.balance(&STRANGER), U256::from(300u64));
    }

    #[test]
    fn stranger_cannot_execute() {
        let (executor, mut ledger) = setup();
        let root = ledger.state_root();
        let data = encode_execute(STRANGER, U256::from(1u64), vec![]);
        assert_eq!(
            executor.execute(&mut ledger, ACCOUNT, STRANGER, &data),
            Err(ExecutionError::Unauthorized {
                account: ACCOUNT,
                caller: STRANGER
            })
        );
        assert_eq!(ledger.state_root(), root);
    }

    #[test]
    fn overdraft_reverts() {
        let (executor, mut ledger) = setup();
        let data = encode_execute(STRANGER, U256::from(1_001u64), vec![]);
        assert!(matches!(
            executor.execute(&mut ledger, ACCOUNT, OWNER, &data),
            Err(ExecutionError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.balance(&ACCOUNT), U256::from(1_000u64));
    }

    #[test]
    fn self_call_configures_guardian() {
        let (executor, mut ledger) = setup();
        let commitment = FieldElement::from_u64(77);
        let inner = AccountCall::SetGuardianCommitment { commitment }.encode();
        let data = encode_execute(ACCOUNT, U256::ZERO, inner);

        executor.execute(&mut ledger, ACCOUNT, ENTRY_POINT, &data).unwrap();
        assert_eq!(
            registry::get_guardian_commitment(&ledger, &ACCOUNT),
            Some(commitment)
        );
    }

    #[test]
    fn calling_another_account_uses_our_identity() {
        let (executor, mut ledger) = setup();
        // ACCOUNT is not OTHER_ACCOUNT's owner, so the nested call is refused
        // and the value moved before it is rolled back.
        let inner = AccountCall::ClearGuardian.encode();
        let data = encode_execute(OTHER_ACCOUNT, U256::from(10u64), inner);
        assert_eq!(
            executor.execute(&mut ledger, ACCOUNT, OWNER, &data),
            Err(ExecutionError::Unauthorized {
                account: OTHER_ACCOUNT,
                caller: ACCOUNT
            })
        );
        assert_eq!(ledger.balance(&ACCOUNT), U256::from(1_000u64));
        assert_eq!(ledger.balance(&OTHER_ACCOUNT), U256::ZERO);
    }

    #[test]
    fn recovery_calls_are_open_to_anyone() {
        let (executor, mut ledger) = setup();
        let call = AccountCall::Recover(RecoveryRequest::ZkProof {
            new_owner: STRANGER,
            current_owner: OWNER,
            nullifier_hash: FieldElement::from_u64(1),
            proof: vec![],
        });
        // Reaches the coordinator (not Unauthorized), which finds no commitment.
        assert_eq!(
            executor.execute(&mut ledger, ACCOUNT, STRANGER, &call.encode()),
            Err(ExecutionError::Recovery(RecoveryError::CommitmentNotSet))
        );
    }

    #[test]
    fn gas_limit_enforced() {
        let (executor, mut ledger) = setup();
        let data = encode_execute(STRANGER, U256::from(1u64), vec![]);
        let base = EXECUTION_BASE_GAS + CALLDATA_BYTE_GAS * data.len() as u128;

        let mut tight = GasMeter::new(base + VALUE_TRANSFER_GAS - 1);
        let err = executor
            .execute_metered(&mut ledger, ACCOUNT, OWNER, &data, &mut tight)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::OutOfGas { .. }));
        assert_eq!(tight.remaining(), 0);
        assert_eq!(ledger.balance(&ACCOUNT), U256::from(1_000u64));

        let mut exact = GasMeter::new(base + VALUE_TRANSFER_GAS);
        executor
            .execute_metered(&mut ledger, ACCOUNT, OWNER, &data, &mut exact)
            .unwrap();
        assert_eq!(exact.used(), base + VALUE_TRANSFER_GAS);
    }

    #[test]
    fn unknown_selector_and_garbage() {
        let (executor, mut ledger) = setup();
        assert_eq!(
            executor.execute(&mut ledger, ACCOUNT, OWNER, &[0xde, 0xad, 0xbe, 0xef]),
            Err(ExecutionError::UnknownFunction {
                selector: [0xde, 0xad, 0xbe, 0xef]
            })
        );
        assert!(matches!(
            executor.execute(&mut ledger, ACCOUNT, OWNER, &[0x01]),
            Err(ExecutionError::MalformedCalldata { .. })
        ));
        let truncated = &encode_execute(STRANGER, U256::ZERO, vec![1; 64])[..40];
        assert!(matches!(
            executor.execute(&mut ledger, ACCOUNT, OWNER, truncated),
            Err(ExecutionError::MalformedCalldata { .. })
        ));
    }

    #[test]
    fn short_guardian_signature_is_invalid() {
        let mut data = recoverWithSignatureCall {
            newOwner: STRANGER,
            nonce: U256::ZERO,
            signature: vec![1u8; 64].into(),
        }
        .abi_encode();
        assert_eq!(
            AccountCall::decode(&data),
            Err(ExecutionError::Recovery(RecoveryError::InvalidSignature))
        );
        data.truncate(3);
        assert!(AccountCall::decode(&data).is_err());
    }

    #[test]
    fn dirty_address_word_is_malformed() {
        let mut data = encode_execute(STRANGER, U256::ZERO, vec![]);
        // High byte of the `dest` slot, just past the selector.
        data[4] = 0x01;
        assert!(matches!(
            AccountCall::decode(&data),
            Err(ExecutionError::MalformedCalldata { .. })
        ));
    }

    #[test]
    fn empty_call_data_is_a_no_op() {
        let (executor, mut ledger) = setup();
        let root = ledger.state_root();
        let mut meter = GasMeter::new(EXECUTION_BASE_GAS);

        executor
            .execute_metered(&mut ledger, ACCOUNT, ENTRY_POINT, &[], &mut meter)
            .unwrap();
        assert_eq!(meter.used(), EXECUTION_BASE_GAS);
        assert_eq!(ledger.state_root(), root);
    }
}
