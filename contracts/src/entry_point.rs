//! # Execution Entry Point
//!
//! Executes batches of [`UserOperation`]s on behalf of smart accounts and
//! settles their gas out of per-account deposits.
//!
//! ## Per-operation pipeline
//!
//! ```text
//!   ┌──────────────┐   ┌─────────┐   ┌───────────┐   ┌─────────┐
//!   │ sender/init  │──▶│  nonce  │──▶│ signature │──▶│ prefund │
//!   └──────────────┘   └─────────┘   └───────────┘   └────┬────┘
//!                                                         │
//!   ┌──────────────┐   ┌─────────┐   ┌───────────┐        │
//!   │   settle     │◀──│ execute │◀──│ nonce + 1 │◀───────┘
//!   └──────────────┘   └─────────┘   └───────────┘
//! ```
//!
//! Anything that fails before `nonce + 1` *rejects* the operation: the
//! ledger is restored, no fee is charged and the nonce is untouched. A
//! settlement that cannot be credited rejects it the same way. Once
//! the nonce is bumped the operation is committed; if the call itself fails
//! only the call's effects are undone and the operation is reported as
//! *reverted*, still paying for the gas it burned.
//!
//! Operations run strictly in array order and each sees the effects of the
//! ones before it. Two operations with the same nonce in one batch: the
//! first wins and the second is rejected with `NonceMismatch`.

use std::sync::Arc;

use aegis_protocol::config::{ChainConfig, ACCOUNT_DEPLOYMENT_GAS, SIGNATURE_VALIDATION_GAS};
use aegis_protocol::crypto::{eth_signed_message_hash, is_signed_by};
use aegis_protocol::storage::{Ledger, LedgerError};
use aegis_protocol::zkp::{FieldElement, ProofVerifier};
use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

use crate::account::{ExecutionError, GasMeter, SmartAccount};
use crate::factory::SmartAccountFactory;
use crate::recovery::RecoveryCoordinator;
use crate::registry;
use crate::user_operation::UserOperation;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an operation was rejected during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    /// The sender is not deployed and the operation carries no `init_code`.
    #[error("sender {sender} is not a deployed account")]
    UnknownSender {
        /// The operation's sender.
        sender: Address,
    },

    /// `init_code` does not deploy the sender through our factory.
    #[error("init code mismatch: {reason}")]
    InitCodeMismatch {
        /// What did not line up.
        reason: String,
    },

    /// Paymasters are not supported.
    #[error("paymaster sponsorship is not supported")]
    UnsupportedPaymaster,

    /// `verification_gas_limit` cannot cover validation.
    #[error("verification gas {provided} below required {required}")]
    VerificationGasTooLow {
        /// Gas validation will consume.
        required: u128,
        /// Gas the operation reserved.
        provided: u128,
    },

    /// `op.nonce` is not the account's next execution nonce.
    #[error("nonce mismatch: expected {expected}, got {provided}")]
    NonceMismatch {
        /// The account's current execution nonce.
        expected: U256,
        /// What the operation carried.
        provided: U256,
    },

    /// The signature does not recover to the account's current owner.
    #[error("operation not signed by the account owner")]
    UnauthorizedSigner,

    /// The sender's deposit cannot cover the worst-case gas cost.
    #[error("insufficient prefund: need {required}, deposit {available}")]
    InsufficientPrefund {
        /// `max_gas * max_fee_per_gas`.
        required: U256,
        /// The sender's deposit.
        available: U256,
    },

    /// Gas fields overflow 256 bits.
    #[error("gas values overflow")]
    GasOverflow,

    /// The refund or the beneficiary payment could not be credited. The
    /// whole operation, call included, is undone.
    #[error("gas settlement failed: {0}")]
    Settlement(LedgerError),
}

/// Errors from deposit management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepositError {
    /// Only the account or its owner may withdraw.
    #[error("caller {caller} may not withdraw from {account}")]
    Unauthorized {
        /// The account whose deposit was targeted.
        account: Address,
        /// Who tried.
        caller: Address,
    },

    /// Ledger arithmetic failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a single operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    /// Validated and the call succeeded.
    Executed,
    /// Validated and charged, but the call reverted.
    Reverted(ExecutionError),
    /// Failed validation; nothing changed.
    Rejected(OpError),
}

/// Result of one operation within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpOutcome {
    /// Position in the batch.
    pub index: usize,
    /// The operation's sender.
    pub sender: Address,
    /// `get_user_op_hash(op)`.
    pub user_op_hash: B256,
    /// What happened.
    pub status: OpStatus,
    /// Gas charged, including pre-verification gas.
    pub actual_gas_used: U256,
    /// Fee paid to the beneficiary.
    pub actual_gas_cost: U256,
}

impl OpOutcome {
    /// Whether the call ran to completion.
    pub fn is_executed(&self) -> bool {
        matches!(self.status, OpStatus::Executed)
    }

    /// Whether the operation passed validation (executed or reverted).
    pub fn is_included(&self) -> bool {
        !matches!(self.status, OpStatus::Rejected(_))
    }
}

// ---------------------------------------------------------------------------
// EntryPoint
// ---------------------------------------------------------------------------

/// The singleton that validates and runs user operations.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    config: ChainConfig,
    account: SmartAccount,
    factory: SmartAccountFactory,
}

impl EntryPoint {
    /// Entry point for `config`, checking ZK recoveries with `verifier`.
    pub fn new(config: ChainConfig, verifier: Arc<dyn ProofVerifier>) -> Self {
        let coordinator = RecoveryCoordinator::new(verifier, config.chain_id);
        Self {
            account: SmartAccount::new(coordinator, config.entry_point),
            factory: SmartAccountFactory::new(config.factory),
            config,
        }
    }

    /// Chain parameters.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// This entry point's address.
    pub fn address(&self) -> Address {
        self.config.entry_point
    }

    /// The account executor operations are routed through.
    pub fn smart_account(&self) -> &SmartAccount {
        &self.account
    }

    /// The factory `init_code` must reference.
    pub fn factory(&self) -> &SmartAccountFactory {
        &self.factory
    }

    /// `keccak(abi.encode(keccak(pack(op)), entry_point, chain_id))`.
    pub fn get_user_op_hash(&self, op: &UserOperation) -> B256 {
        op.hash(self.config.entry_point, self.config.chain_id)
    }

    /// Run `ops` in order, paying fees to `beneficiary`.
    pub fn handle_ops(
        &self,
        ledger: &mut Ledger,
        ops: &[UserOperation],
        beneficiary: Address,
    ) -> Vec<OpOutcome> {
        let outcomes: Vec<OpOutcome> = ops
            .iter()
            .enumerate()
            .map(|(index, op)| self.handle_op(ledger, index, op, beneficiary))
            .collect();

        let executed = outcomes.iter().filter(|o| o.is_executed()).count();
        let included = outcomes.iter().filter(|o| o.is_included()).count();
        tracing::info!(
            ops = ops.len(),
            included,
            executed,
            %beneficiary,
            "batch handled"
        );
        outcomes
    }

    fn handle_op(
        &self,
        ledger: &mut Ledger,
        index: usize,
        op: &UserOperation,
        beneficiary: Address,
    ) -> OpOutcome {
        let user_op_hash = self.get_user_op_hash(op);
        let mut outcome = OpOutcome {
            index,
            sender: op.sender,
            user_op_hash,
            status: OpStatus::Executed,
            actual_gas_used: U256::ZERO,
            actual_gas_cost: U256::ZERO,
        };

        let checkpoint = ledger.checkpoint();
        let (prefund, verification_gas) = match self.validate(ledger, op, &user_op_hash) {
            Ok(v) => v,
            Err(e) => {
                ledger.revert_to(checkpoint);
                tracing::warn!(index, sender = %op.sender, error = %e, "user operation rejected");
                outcome.status = OpStatus::Rejected(e);
                return outcome;
            }
        };

        if let Some(state) = ledger.account_mut(&op.sender) {
            state.execution_nonce += U256::from(1u64);
        }

        let mut meter = GasMeter::new(op.call_gas_limit);
        if let Err(e) = self.account.execute_metered(
            ledger,
            op.sender,
            self.config.entry_point,
            &op.call_data,
            &mut meter,
        ) {
            tracing::warn!(index, sender = %op.sender, error = %e, "user operation reverted");
            outcome.status = OpStatus::Reverted(e);
        }

        let used = op
            .pre_verification_gas
            .saturating_add(U256::from(verification_gas))
            .saturating_add(U256::from(meter.used()));
        let price = U256::from(op.gas_price(self.config.base_fee));
        let cost = used.saturating_mul(price).min(prefund);

        if let Err(e) = self.settle(ledger, op.sender, beneficiary, prefund, cost) {
            ledger.revert_to(checkpoint);
            let e = OpError::Settlement(e);
            tracing::error!(
                index,
                sender = %op.sender,
                %beneficiary,
                error = %e,
                "user operation rejected"
            );
            outcome.status = OpStatus::Rejected(e);
            return outcome;
        }
        ledger.commit(checkpoint);

        outcome.actual_gas_used = used;
        outcome.actual_gas_cost = cost;
        tracing::debug!(
            index,
            sender = %op.sender,
            hash = %user_op_hash,
            gas_used = %used,
            gas_cost = %cost,
            "user operation settled"
        );
        outcome
    }

    /// Steps 0–3. Returns `(prefund, verification gas consumed)`.
    fn validate(
        &self,
        ledger: &mut Ledger,
        op: &UserOperation,
        user_op_hash: &B256,
    ) -> Result<(U256, u128), OpError> {
        if !op.paymaster_and_data.is_empty() {
            return Err(OpError::UnsupportedPaymaster);
        }

        let deploying = !ledger.is_account(&op.sender);
        let mut verification_gas = SIGNATURE_VALIDATION_GAS;
        if deploying {
            verification_gas += ACCOUNT_DEPLOYMENT_GAS;
        }
        if op.verification_gas_limit < verification_gas {
            return Err(OpError::VerificationGasTooLow {
                required: verification_gas,
                provided: op.verification_gas_limit,
            });
        }

        if deploying {
            self.deploy_sender(ledger, op)?;
        } else if !op.init_code.is_empty() {
            return Err(OpError::InitCodeMismatch {
                reason: "sender already deployed".to_string(),
            });
        }

        // The account must exist from here on.
        let state = ledger
            .account(&op.sender)
            .ok_or(OpError::UnknownSender { sender: op.sender })?;

        if op.nonce != state.execution_nonce {
            return Err(OpError::NonceMismatch {
                expected: state.execution_nonce,
                provided: op.nonce,
            });
        }

        let digest = eth_signed_message_hash(user_op_hash);
        if !is_signed_by(&digest, &op.signature, &state.owner) {
            return Err(OpError::UnauthorizedSigner);
        }

        let prefund = op.required_prefund().ok_or(OpError::GasOverflow)?;
        ledger
            .debit_deposit(op.sender, prefund)
            .map_err(|_| OpError::InsufficientPrefund {
                required: prefund,
                available: ledger.deposit(&op.sender),
            })?;

        Ok((prefund, verification_gas))
    }

    fn deploy_sender(&self, ledger: &mut Ledger, op: &UserOperation) -> Result<(), OpError> {
        if op.init_code.is_empty() {
            return Err(OpError::UnknownSender { sender: op.sender });
        }
        let (factory, owner, salt) = SmartAccountFactory::decode_init_code(&op.init_code)
            .map_err(|e| OpError::InitCodeMismatch {
                reason: e.to_string(),
            })?;
        if factory != self.factory.address() {
            return Err(OpError::InitCodeMismatch {
                reason: format!("unknown factory {}", factory),
            });
        }
        let deployed = self
            .factory
            .create_account(ledger, owner, salt)
            .map_err(|e| OpError::InitCodeMismatch {
                reason: e.to_string(),
            })?;
        if deployed != op.sender {
            return Err(OpError::InitCodeMismatch {
                reason: format!("init code deploys {}, not {}", deployed, op.sender),
            });
        }
        Ok(())
    }

    /// Refund `prefund - cost` to the sender's deposit and pay `cost`.
    fn settle(
        &self,
        ledger: &mut Ledger,
        sender: Address,
        beneficiary: Address,
        prefund: U256,
        cost: U256,
    ) -> Result<(), LedgerError> {
        ledger.credit_deposit(sender, prefund - cost)?;
        ledger.credit(beneficiary, cost)
    }

    // -- deposits -----------------------------------------------------------

    /// Add `amount` to `account`'s gas deposit.
    pub fn deposit_to(
        &self,
        ledger: &mut Ledger,
        account: Address,
        amount: U256,
    ) -> Result<(), DepositError> {
        ledger.credit_deposit(account, amount)?;
        tracing::info!(%account, %amount, "deposit added");
        Ok(())
    }

    /// `account`'s gas deposit.
    pub fn balance_of(&self, ledger: &Ledger, account: &Address) -> U256 {
        ledger.deposit(account)
    }

    /// Move `amount` of `account`'s deposit to `to`'s native balance.
    ///
    /// `caller` must be the account itself or its owner.
    pub fn withdraw_to(
        &self,
        ledger: &mut Ledger,
        account: Address,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), DepositError> {
        let authorized = caller == account
            || ledger
                .account(&account)
                .is_some_and(|state| state.owner == caller);
        if !authorized {
            return Err(DepositError::Unauthorized { account, caller });
        }
        ledger.debit_deposit(account, amount)?;
        ledger.credit(to, amount)?;
        tracing::info!(%account, %to, %amount, "deposit withdrawn");
        Ok(())
    }

    // -- reads --------------------------------------------------------------

    /// The next nonce `sender` must use; zero for undeployed senders.
    pub fn get_nonce(&self, ledger: &Ledger, sender: &Address) -> U256 {
        self.get_execution_nonce(ledger, sender)
            .unwrap_or(U256::ZERO)
    }

    /// The account's execution nonce, if it exists.
    pub fn get_execution_nonce(&self, ledger: &Ledger, account: &Address) -> Option<U256> {
        ledger.account(account).map(|state| state.execution_nonce)
    }

    /// The account's owner, if it exists.
    pub fn get_owner(&self, ledger: &Ledger, account: &Address) -> Option<Address> {
        ledger.account(account).map(|state| state.owner)
    }

    /// The account's guardian commitment, if in ZK mode.
    pub fn get_guardian_commitment(
        &self,
        ledger: &Ledger,
        account: &Address,
    ) -> Option<FieldElement> {
        registry::get_guardian_commitment(ledger, account)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{encode_execute, AccountCall};
    use aegis_protocol::crypto::Keypair;

    struct RejectAll;

    impl ProofVerifier for RejectAll {
        fn verify(&self, _proof: &[u8], _inputs: &[FieldElement]) -> bool {
            false
        }
    }

    const BENEFICIARY: Address = Address::repeat_byte(0xbe);
    const RECIPIENT: Address = Address::repeat_byte(0x77);

    struct Fixture {
        entry_point: EntryPoint,
        ledger: Ledger,
        owner: Keypair,
        account: Address,
    }

    fn fixture() -> Fixture {
        let entry_point = EntryPoint::new(ChainConfig::default(), Arc::new(RejectAll));
        let owner = Keypair::from_seed(b"entry-point-owner").unwrap();
        let mut ledger = Ledger::new();
        let account = entry_point
            .factory()
            .create_account(&mut ledger, owner.address(), U256::ZERO)
            .unwrap();
        ledger.credit(account, U256::from(1_000u64)).unwrap();
        entry_point
            .deposit_to(&mut ledger, account, U256::from(10_000_000u64))
            .unwrap();
        Fixture {
            entry_point,
            ledger,
            owner,
            account,
        }
    }

    impl Fixture {
        fn op(&self, nonce: u64, call_data: Vec<u8>) -> UserOperation {
            let cfg = self.entry_point.config();
            let mut op = UserOperation::new(self.account, U256::from(nonce), call_data)
                .with_fees(2, 1);
            op.sign(&self.owner, cfg.entry_point, cfg.chain_id).unwrap();
            op
        }

        fn transfer_op(&self, nonce: u64, value: u64) -> UserOperation {
            self.op(nonce, encode_execute(RECIPIENT, U256::from(value), vec![]))
        }
    }

    #[test]
    fn executes_and_settles_gas() {
        let mut f = fixture();
        let op = f.transfer_op(0, 100);
        let deposit_before = f.ledger.deposit(&f.account);

        let out = f
            .entry_point
            .handle_ops(&mut f.ledger, &[op], BENEFICIARY);
        assert_eq!(out[0].status, OpStatus::Executed);
        assert_eq!(f.ledger.balance(&RECIPIENT), U256::from(100u64));
        assert_eq!(f.entry_point.get_nonce(&f.ledger, &f.account), U256::from(1u64));

        let cost = out[0].actual_gas_cost;
        assert!(cost > U256::ZERO);
        assert_eq!(f.ledger.balance(&BENEFICIARY), cost);
        assert_eq!(f.ledger.deposit(&f.account), deposit_before - cost);
    }

    #[test]
    fn stale_nonce_rejected_without_side_effects() {
        let mut f = fixture();
        let op = f.transfer_op(5, 100);
        let root = f.ledger.state_root();

        let out = f
            .entry_point
            .handle_ops(&mut f.ledger, &[op], BENEFICIARY);
        assert_eq!(
            out[0].status,
            OpStatus::Rejected(OpError::NonceMismatch {
                expected: U256::ZERO,
                provided: U256::from(5u64)
            })
        );
        assert_eq!(out[0].actual_gas_cost, U256::ZERO);
        assert_eq!(f.ledger.state_root(), root);
    }

    #[test]
    fn foreign_signature_rejected() {
        let mut f = fixture();
        let mut op = f.transfer_op(0, 1);
        let cfg = f.entry_point.config().clone();
        op.sign(&Keypair::from_seed(b"intruder").unwrap(), cfg.entry_point, cfg.chain_id)
            .unwrap();

        let out = f
            .entry_point
            .handle_ops(&mut f.ledger, &[op], BENEFICIARY);
        assert_eq!(out[0].status, OpStatus::Rejected(OpError::UnauthorizedSigner));
    }

    #[test]
    fn reverted_call_still_consumes_nonce_and_pays() {
        let mut f = fixture();
        let op = f.transfer_op(0, 5_000);

        let out = f
            .entry_point
            .handle_ops(&mut f.ledger, &[op], BENEFICIARY);
        assert!(matches!(
            out[0].status,
            OpStatus::Reverted(ExecutionError::InsufficientBalance { .. })
        ));
        assert_eq!(f.entry_point.get_nonce(&f.ledger, &f.account), U256::from(1u64));
        assert_eq!(f.ledger.balance(&f.account), U256::from(1_000u64));
        assert_eq!(f.ledger.balance(&BENEFICIARY), out[0].actual_gas_cost);
    }

    #[test]
    fn prefund_must_be_covered() {
        let mut f = fixture();
        let mut op = f.transfer_op(0, 1).with_fees(1_000_000, 1);
        let cfg = f.entry_point.config().clone();
        op.sign(&f.owner, cfg.entry_point, cfg.chain_id).unwrap();

        let out = f
            .entry_point
            .handle_ops(&mut f.ledger, &[op], BENEFICIARY);
        assert!(matches!(
            out[0].status,
            OpStatus::Rejected(OpError::InsufficientPrefund { .. })
        ));
        assert_eq!(f.entry_point.get_nonce(&f.ledger, &f.account), U256::ZERO);
    }

    #[test]
    fn paymaster_and_low_verification_gas_rejected() {
        let mut f = fixture();
        let mut sponsored = f.transfer_op(0, 1);
        sponsored.paymaster_and_data = vec![1u8; 20].into();

        let mut starved = f.transfer_op(0, 1);
        starved.verification_gas_limit = SIGNATURE_VALIDATION_GAS - 1;

        let out = f
            .entry_point
            .handle_ops(&mut f.ledger, &[sponsored, starved], BENEFICIARY);
        assert_eq!(out[0].status, OpStatus::Rejected(OpError::UnsupportedPaymaster));
        assert!(matches!(
            out[1].status,
            OpStatus::Rejected(OpError::VerificationGasTooLow { .. })
        ));
    }

    #[test]
    fn deploys_sender_from_init_code() {
        let entry_point = EntryPoint::new(ChainConfig::default(), Arc::new(RejectAll));
        let owner = Keypair::from_seed(b"fresh").unwrap();
        let salt = U256::from(9u64);
        let sender = entry_point.factory().get_address(owner.address(), salt);

        let mut ledger = Ledger::new();
        entry_point
            .deposit_to(&mut ledger, sender, U256::from(10_000_000u64))
            .unwrap();

        let cfg = entry_point.config().clone();
        let call = encode_execute(RECIPIENT, U256::ZERO, vec![]);
        let mut op = UserOperation::new(sender, U256::ZERO, call)
            .with_init_code(entry_point.factory().init_code(owner.address(), salt))
            .with_fees(1, 1);
        op.sign(&owner, cfg.entry_point, cfg.chain_id).unwrap();

        let out = entry_point.handle_ops(&mut ledger, &[op.clone()], BENEFICIARY);
        assert_eq!(out[0].status, OpStatus::Executed);
        assert_eq!(entry_point.get_owner(&ledger, &sender), Some(owner.address()));

        // Replaying the same init code against a deployed sender is refused.
        let out = entry_point.handle_ops(&mut ledger, &[op], BENEFICIARY);
        assert!(matches!(
            out[0].status,
            OpStatus::Rejected(OpError::InitCodeMismatch { .. })
        ));
    }

    #[test]
    fn deploy_only_operation_executes() {
        let entry_point = EntryPoint::new(ChainConfig::default(), Arc::new(RejectAll));
        let owner = Keypair::from_seed(b"deploy-only").unwrap();
        let sender = entry_point.factory().get_address(owner.address(), U256::ZERO);

        let mut ledger = Ledger::new();
        entry_point
            .deposit_to(&mut ledger, sender, U256::from(10_000_000u64))
            .unwrap();

        let cfg = entry_point.config().clone();
        let mut op = UserOperation::new(sender, U256::ZERO, Vec::<u8>::new())
            .with_init_code(entry_point.factory().init_code(owner.address(), U256::ZERO))
            .with_fees(1, 1);
        op.sign(&owner, cfg.entry_point, cfg.chain_id).unwrap();

        let out = entry_point.handle_ops(&mut ledger, &[op], BENEFICIARY);
        assert_eq!(out[0].status, OpStatus::Executed);
        assert_eq!(entry_point.get_owner(&ledger, &sender), Some(owner.address()));
        assert_eq!(entry_point.get_nonce(&ledger, &sender), U256::from(1u64));
        assert_eq!(ledger.balance(&BENEFICIARY), out[0].actual_gas_cost);
    }

    #[test]
    fn failed_settlement_undoes_the_whole_operation() {
        let mut f = fixture();
        f.ledger.credit(BENEFICIARY, U256::MAX).unwrap();
        let root = f.ledger.state_root();
        let op = f.transfer_op(0, 100);

        let out = f
            .entry_point
            .handle_ops(&mut f.ledger, &[op], BENEFICIARY);
        assert_eq!(
            out[0].status,
            OpStatus::Rejected(OpError::Settlement(LedgerError::Overflow {
                account: BENEFICIARY
            }))
        );
        assert_eq!(out[0].actual_gas_cost, U256::ZERO);
        assert_eq!(f.ledger.state_root(), root);
        assert_eq!(f.ledger.balance(&RECIPIENT), U256::ZERO);
        assert_eq!(f.entry_point.get_nonce(&f.ledger, &f.account), U256::ZERO);
    }

    #[test]
    fn undeployed_sender_without_init_code_rejected() {
        let entry_point = EntryPoint::new(ChainConfig::default(), Arc::new(RejectAll));
        let mut ledger = Ledger::new();
        let op = UserOperation::new(RECIPIENT, U256::ZERO, vec![]);
        let out = entry_point.handle_ops(&mut ledger, &[op], BENEFICIARY);
        assert_eq!(
            out[0].status,
            OpStatus::Rejected(OpError::UnknownSender { sender: RECIPIENT })
        );
        assert_eq!(ledger.account_count(), 0);
    }

    #[test]
    fn guardian_configured_through_user_operation() {
        let mut f = fixture();
        let commitment = FieldElement::from_u64(1234);
        let inner = AccountCall::SetGuardianCommitment { commitment }.encode();
        let op = f.op(0, encode_execute(f.account, U256::ZERO, inner));

        let out = f
            .entry_point
            .handle_ops(&mut f.ledger, &[op], BENEFICIARY);
        assert_eq!(out[0].status, OpStatus::Executed);
        assert_eq!(
            f.entry_point.get_guardian_commitment(&f.ledger, &f.account),
            Some(commitment)
        );
    }

    #[test]
    fn withdraw_requires_owner() {
        let mut f = fixture();
        let stranger = Address::repeat_byte(0x66);
        assert_eq!(
            f.entry_point
                .withdraw_to(&mut f.ledger, f.account, stranger, stranger, U256::from(1u64)),
            Err(DepositError::Unauthorized {
                account: f.account,
                caller: stranger
            })
        );

        f.entry_point
            .withdraw_to(
                &mut f.ledger,
                f.account,
                f.owner.address(),
                RECIPIENT,
                U256::from(500u64),
            )
            .unwrap();
        assert_eq!(f.ledger.balance(&RECIPIENT), U256::from(500u64));
        assert_eq!(
            f.entry_point.balance_of(&f.ledger, &f.account),
            U256::from(10_000_000u64 - 500)
        );
    }

    #[test]
    fn reads_for_unknown_accounts() {
        let f = fixture();
        let nobody = Address::repeat_byte(0x42);
        assert_eq!(f.entry_point.get_nonce(&f.ledger, &nobody), U256::ZERO);
        assert_eq!(f.entry_point.get_execution_nonce(&f.ledger, &nobody), None);
        assert_eq!(f.entry_point.get_owner(&f.ledger, &nobody), None);
    }
}
