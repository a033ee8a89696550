//! # Ledger State
//!
//! Everything the recovery and execution components read and write lives in
//! one explicit [`Ledger`] value: account records, the per-account nullifier
//! sets, native balances, and entry-point deposits. Components never hold
//! hidden state of their own; they receive `&mut Ledger`.
//!
//! ## Checkpoints
//!
//! [`Ledger::checkpoint`] opens an undo journal. While a checkpoint is open
//! every mutation records the value it overwrote: one account record, one
//! balance or deposit, or one nullifier insertion. [`Ledger::revert_to`]
//! replays those entries backwards, [`Ledger::commit`] forgets them.
//! Checkpoints nest (the entry point holds one around each user operation,
//! the account executor one around each call) and must be closed in the
//! reverse order they were opened. Rolling back costs what the operation
//! touched, not the size of the ledger.
//!
//! ## Commit point
//!
//! [`SharedLedger`] wraps the ledger in `Arc<parking_lot::RwLock<_>>`. Any
//! state transition that must be atomic with respect to other callers
//! (two guardians racing to recover the same account, a user operation
//! racing a direct owner call) runs under the write lock, so one of them
//! observes the other's result.
//!
//! ## State root
//!
//! [`Ledger::state_root`] is a BLAKE3 Merkle root over sorted leaves, one
//! per account, consumed nullifier, balance, and deposit. All maps are
//! `BTreeMap`/`BTreeSet`, so iteration order (and therefore the root) is
//! independent of insertion order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::hash::blake3_hash;
use crate::zkp::field::FieldElement;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by ledger-level bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A debit exceeded the available amount.
    #[error("insufficient funds for {account}: have {available}, need {needed}")]
    InsufficientFunds {
        /// Account being debited.
        account: Address,
        /// Amount requested.
        needed: U256,
        /// Amount available.
        available: U256,
    },

    /// A credit would overflow 256 bits.
    #[error("balance overflow for {account}")]
    Overflow {
        /// Account being credited.
        account: Address,
    },
}

// ---------------------------------------------------------------------------
// AccountState
// ---------------------------------------------------------------------------

/// How (and whether) an account can be recovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryMode {
    /// A guardian key signs EIP-712 `Recover` messages.
    Signature {
        /// The guardian's address.
        guardian: Address,
    },
    /// A guardian proves knowledge of the commitment's opening.
    ZkCommitment {
        /// `FieldHash(secret_key, secret_answer)`.
        commitment: FieldElement,
    },
}

/// The state of one smart account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// The controlling key. Never zero once initialized.
    pub owner: Address,
    /// Next expected user-operation nonce.
    pub execution_nonce: U256,
    /// Next expected guardian-signature nonce.
    pub recovery_nonce: U256,
    /// `None` means the account is unrecoverable.
    pub recovery_mode: Option<RecoveryMode>,
}

impl AccountState {
    /// A fresh account: nonces at zero, no guardian.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            execution_nonce: U256::ZERO,
            recovery_nonce: U256::ZERO,
            recovery_mode: None,
        }
    }

    /// The guardian commitment, if the account is in ZK mode.
    pub fn commitment(&self) -> Option<FieldElement> {
        match self.recovery_mode {
            Some(RecoveryMode::ZkCommitment { commitment }) => Some(commitment),
            _ => None,
        }
    }

    /// The guardian address, if the account is in signature mode.
    pub fn guardian(&self) -> Option<Address> {
        match self.recovery_mode {
            Some(RecoveryMode::Signature { guardian }) => Some(guardian),
            _ => None,
        }
    }

    /// Canonical bytes for hashing. Fixed layout, no serializer involved.
    fn to_hash_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(20 + 32 + 32 + 1 + 32);
        out.extend_from_slice(self.owner.as_slice());
        out.extend_from_slice(&self.execution_nonce.to_be_bytes::<32>());
        out.extend_from_slice(&self.recovery_nonce.to_be_bytes::<32>());
        match self.recovery_mode {
            None => out.push(0),
            Some(RecoveryMode::Signature { guardian }) => {
                out.push(1);
                out.extend_from_slice(guardian.as_slice());
            }
            Some(RecoveryMode::ZkCommitment { commitment }) => {
                out.push(2);
                out.extend_from_slice(&commitment.to_bytes());
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// NullifierLedger
// ---------------------------------------------------------------------------

/// Consumed nullifiers, scoped per account.
///
/// Entries are never removed. The set grows by one element per successful
/// ZK recovery; that growth is the price of at-most-once semantics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierLedger {
    consumed: BTreeMap<Address, BTreeSet<FieldElement>>,
}

impl NullifierLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Has `nullifier` already been consumed by `account`?
    pub fn contains(&self, account: &Address, nullifier: &FieldElement) -> bool {
        self.consumed
            .get(account)
            .map_or(false, |set| set.contains(nullifier))
    }

    /// Mark `nullifier` consumed. Returns `false` if it already was.
    pub fn insert(&mut self, account: Address, nullifier: FieldElement) -> bool {
        self.consumed.entry(account).or_default().insert(nullifier)
    }

    /// Undo an insertion made under a checkpoint.
    fn remove(&mut self, account: &Address, nullifier: &FieldElement) {
        if let Some(set) = self.consumed.get_mut(account) {
            set.remove(nullifier);
            if set.is_empty() {
                self.consumed.remove(account);
            }
        }
    }

    /// Number of nullifiers consumed by `account`.
    pub fn count(&self, account: &Address) -> usize {
        self.consumed.get(account).map_or(0, BTreeSet::len)
    }

    /// Total across all accounts.
    pub fn len(&self) -> usize {
        self.consumed.values().map(BTreeSet::len).sum()
    }

    /// `true` if nothing has been consumed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(account, nullifier)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &FieldElement)> {
        self.consumed
            .iter()
            .flat_map(|(account, set)| set.iter().map(move |n| (account, n)))
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One overwritten value, recorded while a checkpoint is open.
#[derive(Clone, Debug)]
enum Undo {
    Account {
        address: Address,
        previous: Option<AccountState>,
    },
    Nullifier {
        account: Address,
        nullifier: FieldElement,
    },
    Balance {
        address: Address,
        previous: U256,
    },
    Deposit {
        address: Address,
        previous: U256,
    },
}

/// A position in the ledger's undo journal.
///
/// Returned by [`Ledger::checkpoint`] and consumed by exactly one of
/// [`Ledger::commit`] or [`Ledger::revert_to`].
#[derive(Debug)]
#[must_use = "a checkpoint must be committed or reverted"]
pub struct Checkpoint {
    mark: usize,
}

/// The complete mutable world.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    accounts: BTreeMap<Address, AccountState>,
    nullifiers: NullifierLedger,
    balances: BTreeMap<Address, U256>,
    deposits: BTreeMap<Address, U256>,
    #[serde(skip)]
    journal: Vec<Undo>,
    #[serde(skip)]
    open_checkpoints: usize,
}

impl PartialEq for Ledger {
    fn eq(&self, other: &Self) -> bool {
        self.accounts == other.accounts
            && self.nullifiers == other.nullifiers
            && self.balances == other.balances
            && self.deposits == other.deposits
    }
}

impl Eq for Ledger {}

impl Ledger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Checkpoints --------------------------------------------------------

    /// Start recording undo entries.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.open_checkpoints += 1;
        Checkpoint {
            mark: self.journal.len(),
        }
    }

    /// Keep every change made since `checkpoint`.
    ///
    /// Inside an outer checkpoint the entries stay journaled so the outer
    /// one can still revert them.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        debug_assert!(checkpoint.mark <= self.journal.len());
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.journal.clear();
        }
    }

    /// Undo every change made since `checkpoint`, newest first.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.mark {
            let Some(undo) = self.journal.pop() else {
                break;
            };
            match undo {
                Undo::Account { address, previous } => match previous {
                    Some(state) => {
                        self.accounts.insert(address, state);
                    }
                    None => {
                        self.accounts.remove(&address);
                    }
                },
                Undo::Nullifier { account, nullifier } => {
                    self.nullifiers.remove(&account, &nullifier);
                }
                Undo::Balance { address, previous } => {
                    restore_entry(&mut self.balances, address, previous);
                }
                Undo::Deposit { address, previous } => {
                    restore_entry(&mut self.deposits, address, previous);
                }
            }
        }
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
    }

    fn record(&mut self, undo: impl FnOnce(&Self) -> Undo) {
        if self.open_checkpoints > 0 {
            let entry = undo(self);
            self.journal.push(entry);
        }
    }

    fn record_account(&mut self, address: Address) {
        self.record(|ledger| Undo::Account {
            address,
            previous: ledger.accounts.get(&address).cloned(),
        });
    }

    // -- Accounts -----------------------------------------------------------

    /// Look up a smart account.
    pub fn account(&self, address: &Address) -> Option<&AccountState> {
        self.accounts.get(address)
    }

    /// Mutable access to a smart account.
    pub fn account_mut(&mut self, address: &Address) -> Option<&mut AccountState> {
        if self.accounts.contains_key(address) {
            self.record_account(*address);
        }
        self.accounts.get_mut(address)
    }

    /// Is there a smart account at `address`?
    pub fn is_account(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Insert or replace an account record.
    pub fn insert_account(&mut self, address: Address, state: AccountState) {
        self.record_account(address);
        self.accounts.insert(address, state);
    }

    /// Iterate all accounts in address order.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &AccountState)> {
        self.accounts.iter()
    }

    /// Number of deployed accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // -- Nullifiers ---------------------------------------------------------

    /// The nullifier ledger.
    pub fn nullifiers(&self) -> &NullifierLedger {
        &self.nullifiers
    }

    /// Consume `nullifier` for `account`. Returns `false` if it already was.
    pub fn consume_nullifier(&mut self, account: Address, nullifier: FieldElement) -> bool {
        let inserted = self.nullifiers.insert(account, nullifier);
        if inserted {
            self.record(|_| Undo::Nullifier { account, nullifier });
        }
        inserted
    }

    // -- Native balances ----------------------------------------------------

    /// Native balance of any address (zero if never credited).
    pub fn balance(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or(U256::ZERO)
    }

    /// Add to a native balance.
    pub fn credit(&mut self, address: Address, amount: U256) -> Result<(), LedgerError> {
        let previous = self.balance(&address);
        credit_entry(&mut self.balances, address, amount)?;
        self.record(|_| Undo::Balance { address, previous });
        Ok(())
    }

    /// Subtract from a native balance.
    pub fn debit(&mut self, address: Address, amount: U256) -> Result<(), LedgerError> {
        let previous = self.balance(&address);
        debit_entry(&mut self.balances, address, amount)?;
        self.record(|_| Undo::Balance { address, previous });
        Ok(())
    }

    /// Iterate non-zero native balances.
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.balances.iter()
    }

    // -- Entry-point deposits -----------------------------------------------

    /// Gas deposit held by the entry point for `address`.
    pub fn deposit(&self, address: &Address) -> U256 {
        self.deposits.get(address).copied().unwrap_or(U256::ZERO)
    }

    /// Add to a deposit.
    pub fn credit_deposit(&mut self, address: Address, amount: U256) -> Result<(), LedgerError> {
        let previous = self.deposit(&address);
        credit_entry(&mut self.deposits, address, amount)?;
        self.record(|_| Undo::Deposit { address, previous });
        Ok(())
    }

    /// Subtract from a deposit.
    pub fn debit_deposit(&mut self, address: Address, amount: U256) -> Result<(), LedgerError> {
        let previous = self.deposit(&address);
        debit_entry(&mut self.deposits, address, amount)?;
        self.record(|_| Undo::Deposit { address, previous });
        Ok(())
    }

    /// Iterate non-zero deposits.
    pub fn deposits(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.deposits.iter()
    }

    // -- Digest -------------------------------------------------------------

    /// BLAKE3 Merkle root of the whole ledger.
    ///
    /// 1. One leaf per entry: `BLAKE3(tag || key || value)` with a distinct
    ///    one-byte tag per map, so an account can never collide with a
    ///    balance.
    /// 2. Leaves are produced in `BTreeMap` order.
    /// 3. A binary Merkle tree is built over them, duplicating the last
    ///    node on odd levels.
    ///
    /// An empty ledger returns `[0u8; 32]`.
    pub fn state_root(&self) -> [u8; 32] {
        let mut leaves: Vec<[u8; 32]> = Vec::new();

        for (address, state) in &self.accounts {
            leaves.push(leaf(b'a', address, &state.to_hash_bytes()));
        }
        for (address, nullifier) in self.nullifiers.iter() {
            leaves.push(leaf(b'n', address, &nullifier.to_bytes()));
        }
        for (address, amount) in &self.balances {
            leaves.push(leaf(b'b', address, &amount.to_be_bytes::<32>()));
        }
        for (address, amount) in &self.deposits {
            leaves.push(leaf(b'd', address, &amount.to_be_bytes::<32>()));
        }

        merkle_root(leaves)
    }

    /// Wrap into a [`SharedLedger`].
    pub fn into_shared(self) -> SharedLedger {
        SharedLedger::new(self)
    }
}

fn credit_entry(
    map: &mut BTreeMap<Address, U256>,
    address: Address,
    amount: U256,
) -> Result<(), LedgerError> {
    if amount.is_zero() {
        return Ok(());
    }
    let entry = map.entry(address).or_insert(U256::ZERO);
    *entry = entry
        .checked_add(amount)
        .ok_or(LedgerError::Overflow { account: address })?;
    Ok(())
}

fn debit_entry(
    map: &mut BTreeMap<Address, U256>,
    address: Address,
    amount: U256,
) -> Result<(), LedgerError> {
    if amount.is_zero() {
        return Ok(());
    }
    let available = map.get(&address).copied().unwrap_or(U256::ZERO);
    let remaining = available
        .checked_sub(amount)
        .ok_or(LedgerError::InsufficientFunds {
            account: address,
            needed: amount,
            available,
        })?;
    // Zero entries are dropped so the state root only sees live balances.
    if remaining.is_zero() {
        map.remove(&address);
    } else {
        map.insert(address, remaining);
    }
    Ok(())
}

fn restore_entry(map: &mut BTreeMap<Address, U256>, address: Address, previous: U256) {
    if previous.is_zero() {
        map.remove(&address);
    } else {
        map.insert(address, previous);
    }
}

fn leaf(tag: u8, address: &Address, value: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(1 + 20 + value.len());
    preimage.push(tag);
    preimage.extend_from_slice(address.as_slice());
    preimage.extend_from_slice(value);
    blake3_hash(&preimage)
}

fn merkle_root(mut level: Vec<[u8; 32]>) -> [u8; 32] {
    if level.is_empty() {
        return [0u8; 32];
    }
    while level.len() > 1 {
        let mut next_level = Vec::with_capacity((level.len() + 1) / 2);
        for chunk in level.chunks(2) {
            let mut combined = Vec::with_capacity(64);
            combined.extend_from_slice(&chunk[0]);
            combined.extend_from_slice(chunk.get(1).unwrap_or(&chunk[0]));
            next_level.push(blake3_hash(&combined));
        }
        level = next_level;
    }
    level[0]
}

// ---------------------------------------------------------------------------
// SharedLedger
// ---------------------------------------------------------------------------

/// Thread-safe handle to a [`Ledger`]. Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    /// Wrap a ledger.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read()
    }

    /// Exclusive write access. This is the commit point.
    pub fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write()
    }

    /// Run `f` under the write lock inside a checkpoint, keeping its
    /// changes only if `f` succeeds. On `Err` the ledger is untouched.
    pub fn transact<T, E>(&self, f: impl FnOnce(&mut Ledger) -> Result<T, E>) -> Result<T, E> {
        let mut guard = self.inner.write();
        let checkpoint = guard.checkpoint();
        match f(&mut *guard) {
            Ok(out) => {
                guard.commit(checkpoint);
                Ok(out)
            }
            Err(e) => {
                guard.revert_to(checkpoint);
                Err(e)
            }
        }
    }

    /// Copy of the current ledger.
    pub fn snapshot(&self) -> Ledger {
        self.inner.read().clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn empty_ledger_root_is_zero() {
        assert_eq!(Ledger::new().state_root(), [0u8; 32]);
    }

    #[test]
    fn root_is_independent_of_insertion_order() {
        let mut a = Ledger::new();
        a.insert_account(addr(1), AccountState::new(addr(0xa1)));
        a.insert_account(addr(2), AccountState::new(addr(0xa2)));
        a.credit(addr(3), U256::from(10u64)).unwrap();

        let mut b = Ledger::new();
        b.credit(addr(3), U256::from(10u64)).unwrap();
        b.insert_account(addr(2), AccountState::new(addr(0xa2)));
        b.insert_account(addr(1), AccountState::new(addr(0xa1)));

        assert_eq!(a.state_root(), b.state_root());
    }

    #[test]
    fn root_tracks_every_field() {
        let mut ledger = Ledger::new();
        ledger.insert_account(addr(1), AccountState::new(addr(0xa1)));
        let base = ledger.state_root();

        let mut nonce = ledger.clone();
        nonce.account_mut(&addr(1)).unwrap().execution_nonce = U256::from(1u64);
        assert_ne!(nonce.state_root(), base);

        let mut mode = ledger.clone();
        mode.account_mut(&addr(1)).unwrap().recovery_mode = Some(RecoveryMode::ZkCommitment {
            commitment: FieldElement::from_u64(7),
        });
        assert_ne!(mode.state_root(), base);

        let mut nul = ledger.clone();
        nul.consume_nullifier(addr(1), FieldElement::from_u64(9));
        assert_ne!(nul.state_root(), base);

        let mut dep = ledger.clone();
        dep.credit_deposit(addr(1), U256::from(1u64)).unwrap();
        assert_ne!(dep.state_root(), base);

        // Same amount as a balance rather than a deposit: different leaf tag.
        let mut bal = ledger.clone();
        bal.credit(addr(1), U256::from(1u64)).unwrap();
        assert_ne!(bal.state_root(), dep.state_root());
    }

    #[test]
    fn nullifiers_are_scoped_per_account() {
        let mut set = NullifierLedger::new();
        let n = FieldElement::from_u64(42);

        assert!(set.insert(addr(1), n));
        assert!(!set.insert(addr(1), n), "second insert reports reuse");
        assert!(set.contains(&addr(1), &n));
        assert!(!set.contains(&addr(2), &n));

        assert!(set.insert(addr(2), n));
        assert_eq!(set.count(&addr(1)), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn debit_checks_available_funds() {
        let mut ledger = Ledger::new();
        ledger.credit(addr(1), U256::from(100u64)).unwrap();

        let err = ledger.debit(addr(1), U256::from(101u64)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                account: addr(1),
                needed: U256::from(101u64),
                available: U256::from(100u64),
            }
        );
        assert_eq!(ledger.balance(&addr(1)), U256::from(100u64));

        ledger.debit(addr(1), U256::from(100u64)).unwrap();
        assert_eq!(ledger.balance(&addr(1)), U256::ZERO);
        assert_eq!(ledger.balances().count(), 0, "zero balances are pruned");
    }

    #[test]
    fn credit_overflow_is_reported() {
        let mut ledger = Ledger::new();
        ledger.credit_deposit(addr(1), U256::MAX).unwrap();
        assert_eq!(
            ledger.credit_deposit(addr(1), U256::from(1u64)),
            Err(LedgerError::Overflow { account: addr(1) })
        );
    }

    #[test]
    fn account_mode_accessors() {
        let mut state = AccountState::new(addr(1));
        assert_eq!(state.commitment(), None);
        assert_eq!(state.guardian(), None);

        state.recovery_mode = Some(RecoveryMode::Signature { guardian: addr(9) });
        assert_eq!(state.guardian(), Some(addr(9)));
        assert_eq!(state.commitment(), None);
    }

    fn populated() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.insert_account(addr(1), AccountState::new(addr(0xa1)));
        ledger.credit(addr(1), U256::from(100u64)).unwrap();
        ledger.credit_deposit(addr(1), U256::from(50u64)).unwrap();
        for n in 0..64 {
            ledger.consume_nullifier(addr(2), FieldElement::from_u64(n));
        }
        ledger
    }

    #[test]
    fn revert_restores_every_kind_of_change() {
        let mut ledger = populated();
        let before = ledger.clone();
        let root = ledger.state_root();

        let checkpoint = ledger.checkpoint();
        ledger.account_mut(&addr(1)).unwrap().owner = addr(0xb1);
        ledger.insert_account(addr(3), AccountState::new(addr(0xa3)));
        assert!(ledger.consume_nullifier(addr(1), FieldElement::from_u64(7)));
        assert!(!ledger.consume_nullifier(addr(2), FieldElement::from_u64(7)));
        ledger.debit(addr(1), U256::from(100u64)).unwrap();
        ledger.credit(addr(4), U256::from(9u64)).unwrap();
        ledger.debit_deposit(addr(1), U256::from(20u64)).unwrap();
        ledger.revert_to(checkpoint);

        assert_eq!(ledger, before);
        assert_eq!(ledger.state_root(), root);
        assert_eq!(ledger.nullifiers().count(&addr(2)), 64);
        assert_eq!(ledger.nullifiers().count(&addr(1)), 0);
    }

    #[test]
    fn journal_holds_only_what_was_touched() {
        let mut ledger = populated();
        let checkpoint = ledger.checkpoint();
        ledger.credit(addr(1), U256::from(1u64)).unwrap();
        assert_eq!(ledger.journal.len(), 1);
        ledger.commit(checkpoint);
        assert!(ledger.journal.is_empty());

        // Outside a checkpoint nothing is recorded.
        ledger.credit(addr(1), U256::from(1u64)).unwrap();
        assert!(ledger.journal.is_empty());
        assert_eq!(ledger.balance(&addr(1)), U256::from(102u64));
    }

    #[test]
    fn nested_checkpoints_revert_independently() {
        let mut ledger = populated();
        let before = ledger.clone();

        let outer = ledger.checkpoint();
        ledger.credit(addr(5), U256::from(1u64)).unwrap();

        let inner = ledger.checkpoint();
        ledger.credit(addr(6), U256::from(2u64)).unwrap();
        ledger.revert_to(inner);
        assert_eq!(ledger.balance(&addr(6)), U256::ZERO);
        assert_eq!(ledger.balance(&addr(5)), U256::from(1u64));

        let inner = ledger.checkpoint();
        ledger.credit(addr(7), U256::from(3u64)).unwrap();
        ledger.commit(inner);
        assert_eq!(ledger.balance(&addr(7)), U256::from(3u64));

        // The outer checkpoint still undoes the committed inner change.
        ledger.revert_to(outer);
        assert_eq!(ledger, before);
        assert!(ledger.journal.is_empty());
    }

    #[test]
    fn journal_is_not_persisted() {
        let mut ledger = populated();
        let checkpoint = ledger.checkpoint();
        ledger.credit(addr(1), U256::from(1u64)).unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        ledger.commit(checkpoint);

        let restored: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ledger);
        assert!(restored.journal.is_empty());
    }

    #[test]
    fn transact_commits_only_on_success() {
        let shared = Ledger::new().into_shared();

        let failed: Result<(), LedgerError> = shared.transact(|l| {
            l.credit(addr(1), U256::from(5u64))?;
            l.debit(addr(2), U256::from(1u64))
        });
        assert!(failed.is_err());
        assert_eq!(shared.read().balance(&addr(1)), U256::ZERO);

        shared
            .transact(|l| l.credit(addr(1), U256::from(5u64)))
            .unwrap();
        assert_eq!(shared.read().balance(&addr(1)), U256::from(5u64));
    }

    #[test]
    fn clones_share_state() {
        let shared = SharedLedger::default();
        let other = shared.clone();
        other
            .write()
            .insert_account(addr(1), AccountState::new(addr(2)));
        assert!(shared.read().is_account(&addr(1)));
        assert_eq!(shared.snapshot().account_count(), 1);
    }
}
