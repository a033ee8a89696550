//! # Commitment Registry
//!
//! Records which guardian, if any, may recover an account. An account is in
//! exactly one of three modes:
//!
//! - **Unrecoverable**: no guardian configured (the default).
//! - **Signature**: a guardian address signs EIP-712 `Recover` messages.
//! - **ZkCommitment**: a guardian proves knowledge of the opening of a
//!   Poseidon commitment.
//!
//! Only the current owner can change the mode. Setting a new guardian
//! replaces the old one outright; there is never more than one.

use aegis_protocol::storage::{Ledger, RecoveryMode};
use aegis_protocol::zkp::FieldElement;
use alloy_primitives::Address;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while configuring a guardian.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No smart account exists at the address.
    #[error("unknown account {account}")]
    UnknownAccount {
        /// The address that was looked up.
        account: Address,
    },

    /// The caller is not the account's owner.
    #[error("caller {caller} is not the owner of {account}")]
    Unauthorized {
        /// The account being configured.
        account: Address,
        /// Who tried.
        caller: Address,
    },

    /// A signature-mode guardian cannot be the zero address.
    #[error("guardian address must be non-zero")]
    ZeroGuardian,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Switch `account` to ZK mode with `commitment`, replacing any guardian.
pub fn set_guardian_commitment(
    ledger: &mut Ledger,
    account: Address,
    caller: Address,
    commitment: FieldElement,
) -> Result<(), RegistryError> {
    set_mode(
        ledger,
        account,
        caller,
        Some(RecoveryMode::ZkCommitment { commitment }),
    )?;
    tracing::info!(%account, %commitment, "guardian commitment set");
    Ok(())
}

/// Switch `account` to signature mode with `guardian`.
pub fn set_guardian_address(
    ledger: &mut Ledger,
    account: Address,
    caller: Address,
    guardian: Address,
) -> Result<(), RegistryError> {
    if guardian == Address::ZERO {
        return Err(RegistryError::ZeroGuardian);
    }
    set_mode(
        ledger,
        account,
        caller,
        Some(RecoveryMode::Signature { guardian }),
    )?;
    tracing::info!(%account, %guardian, "guardian address set");
    Ok(())
}

/// Remove the guardian; the account becomes unrecoverable.
pub fn clear_guardian(
    ledger: &mut Ledger,
    account: Address,
    caller: Address,
) -> Result<(), RegistryError> {
    set_mode(ledger, account, caller, None)?;
    tracing::info!(%account, "guardian cleared");
    Ok(())
}

/// The commitment on record, if the account is in ZK mode.
pub fn get_guardian_commitment(ledger: &Ledger, account: &Address) -> Option<FieldElement> {
    ledger.account(account).and_then(|state| state.commitment())
}

/// Number of configured guardians: 0 or 1.
pub fn guardian_count(ledger: &Ledger, account: &Address) -> usize {
    ledger
        .account(account)
        .map_or(0, |state| usize::from(state.recovery_mode.is_some()))
}

fn set_mode(
    ledger: &mut Ledger,
    account: Address,
    caller: Address,
    mode: Option<RecoveryMode>,
) -> Result<(), RegistryError> {
    let state = ledger
        .account_mut(&account)
        .ok_or(RegistryError::UnknownAccount { account })?;

    if state.owner != caller {
        tracing::warn!(%account, %caller, "guardian update refused: not the owner");
        return Err(RegistryError::Unauthorized { account, caller });
    }

    state.recovery_mode = mode;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
