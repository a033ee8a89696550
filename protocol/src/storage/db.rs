//! # LedgerDb — Persistent Storage Engine
//!
//! The persistence layer for the ledger, built on sled's embedded
//! key-value store. The in-memory [`Ledger`] is the source of truth while a
//! process runs; this module snapshots it to disk and loads it back.
//!
//! ## Tree Layout
//!
//! | Tree          | Key                               | Value                   |
//! |---------------|-----------------------------------|-------------------------|
//! | `accounts`    | `address` (20B)                   | `bincode(AccountState)` |
//! | `nullifiers`  | `address` (20B) `nullifier` (32B) | empty                   |
//! | `balances`    | `address` (20B)                   | `U256` (32B BE)         |
//! | `deposits`    | `address` (20B)                   | `U256` (32B BE)         |
//! | `metadata`    | key (UTF-8)                       | value (bytes)           |
//!
//! Nullifier keys are prefixed by the account so that a prefix scan returns
//! one account's consumed set in order.
//!
//! ## Integrity
//!
//! `save_ledger` records the ledger's state root in `metadata`;
//! `load_ledger` recomputes it from what it read and refuses a snapshot
//! whose root does not match.

use alloy_primitives::{Address, U256};
use sled::{Batch, Db, Tree};
use std::collections::BTreeSet;
use std::path::Path;

use super::state::{AccountState, Ledger};
use crate::config::{ADDRESS_LENGTH, FIELD_ELEMENT_LENGTH};
use crate::zkp::field::FieldElement;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Underlying sled failure.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// A value failed to encode or decode.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A required key is absent.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The stored snapshot does not hash to its recorded state root.
    #[error("state root mismatch: stored {stored}, computed {computed}")]
    StateRootMismatch {
        /// Hex root recorded at save time.
        stored: String,
        /// Hex root of what was loaded.
        computed: String,
    },
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Metadata Keys
// ---------------------------------------------------------------------------

/// Well-known key in the `metadata` tree for the last saved state root.
const META_STATE_ROOT: &[u8] = b"state_root";

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent storage for a [`Ledger`].
///
/// sled is thread-safe; `LedgerDb` can be shared via `Arc<LedgerDb>` or
/// cloned cheaply.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    accounts: Tree,
    nullifiers: Tree,
    balances: Tree,
    deposits: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let accounts = db.open_tree("accounts")?;
        let nullifiers = db.open_tree("nullifiers")?;
        let balances = db.open_tree("balances")?;
        let deposits = db.open_tree("deposits")?;
        let metadata = db.open_tree("metadata")?;

        Ok(Self {
            db,
            accounts,
            nullifiers,
            balances,
            deposits,
            metadata,
        })
    }

    // -- Snapshot -----------------------------------------------------------

    /// Persist the whole ledger.
    ///
    /// Each tree is rewritten with a single `Batch` that removes keys the
    /// ledger no longer has and inserts everything it does. The state root
    /// is written last and the database flushed.
    pub fn save_ledger(&self, ledger: &Ledger) -> DbResult<()> {
        let mut batch = Batch::default();
        let mut live = BTreeSet::new();
        for (address, state) in ledger.accounts() {
            let bytes =
                bincode::serialize(state).map_err(|e| DbError::Serialization(e.to_string()))?;
            batch.insert(address.as_slice(), bytes);
            live.insert(address.to_vec());
        }
        self.apply_replacing(&self.accounts, batch, &live)?;

        let mut batch = Batch::default();
        let mut live = BTreeSet::new();
        for (address, nullifier) in ledger.nullifiers().iter() {
            let key = nullifier_key(address, nullifier);
            batch.insert(key.as_slice(), &[] as &[u8]);
            live.insert(key);
        }
        self.apply_replacing(&self.nullifiers, batch, &live)?;

        self.save_amounts(&self.balances, ledger.balances())?;
        self.save_amounts(&self.deposits, ledger.deposits())?;

        self.metadata
            .insert(META_STATE_ROOT, &ledger.state_root()[..])?;
        self.db.flush()?;

        tracing::debug!(
            accounts = ledger.account_count(),
            nullifiers = ledger.nullifiers().len(),
            "ledger saved"
        );
        Ok(())
    }

    /// Load the ledger. An empty database yields an empty ledger.
    pub fn load_ledger(&self) -> DbResult<Ledger> {
        let mut ledger = Ledger::new();

        for entry in self.accounts.iter() {
            let (key, value) = entry?;
            let address = decode_address(&key)?;
            let state: AccountState = bincode::deserialize(&value)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            ledger.insert_account(address, state);
        }

        for entry in self.nullifiers.iter() {
            let (key, _) = entry?;
            if key.len() != ADDRESS_LENGTH + FIELD_ELEMENT_LENGTH {
                return Err(DbError::Serialization("invalid nullifier key".to_string()));
            }
            let address = decode_address(&key[..ADDRESS_LENGTH])?;
            let mut raw = [0u8; FIELD_ELEMENT_LENGTH];
            raw.copy_from_slice(&key[ADDRESS_LENGTH..]);
            let nullifier = FieldElement::from_bytes(&raw)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            ledger.consume_nullifier(address, nullifier);
        }

        for (address, amount) in load_amounts(&self.balances)? {
            ledger
                .credit(address, amount)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
        }
        for (address, amount) in load_amounts(&self.deposits)? {
            ledger
                .credit_deposit(address, amount)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
        }

        if let Some(stored) = self.state_root()? {
            let computed = ledger.state_root();
            if stored != computed {
                return Err(DbError::StateRootMismatch {
                    stored: hex::encode(stored),
                    computed: hex::encode(computed),
                });
            }
        }

        Ok(ledger)
    }

    /// The state root recorded by the last `save_ledger`, if any.
    pub fn state_root(&self) -> DbResult<Option<[u8; 32]>> {
        match self.metadata.get(META_STATE_ROOT)? {
            Some(bytes) => {
                let root: [u8; 32] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| DbError::Serialization("invalid state root bytes".to_string()))?;
                Ok(Some(root))
            }
            None => Ok(None),
        }
    }

    // -- Metadata operations ------------------------------------------------

    /// Store an arbitrary metadata value.
    pub fn put_metadata(&self, key: &str, value: &[u8]) -> DbResult<()> {
        self.metadata.insert(key.as_bytes(), value)?;
        Ok(())
    }

    /// Read a metadata value.
    pub fn get_metadata(&self, key: &str) -> DbResult<Option<Vec<u8>>> {
        Ok(self.metadata.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    /// Read a metadata value that must exist.
    pub fn require_metadata(&self, key: &str) -> DbResult<Vec<u8>> {
        self.get_metadata(key)?
            .ok_or_else(|| DbError::NotFound(key.to_string()))
    }

    // -- Utility operations -------------------------------------------------

    /// Number of persisted accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of persisted nullifiers across all accounts.
    pub fn nullifier_count(&self) -> usize {
        self.nullifiers.len()
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }

    // -- Internals ----------------------------------------------------------

    fn save_amounts<'a>(
        &self,
        tree: &Tree,
        entries: impl Iterator<Item = (&'a Address, &'a U256)>,
    ) -> DbResult<()> {
        let mut batch = Batch::default();
        let mut live = BTreeSet::new();
        for (address, amount) in entries {
            batch.insert(address.as_slice(), &amount.to_be_bytes::<32>()[..]);
            live.insert(address.to_vec());
        }
        self.apply_replacing(tree, batch, &live)
    }

    fn apply_replacing(
        &self,
        tree: &Tree,
        mut batch: Batch,
        live: &BTreeSet<Vec<u8>>,
    ) -> DbResult<()> {
        for key in tree.iter().keys() {
            let key = key?;
            if !live.contains(key.as_ref()) {
                batch.remove(key);
            }
        }
        tree.apply_batch(batch)?;
        Ok(())
    }
}

fn nullifier_key(address: &Address, nullifier: &FieldElement) -> Vec<u8> {
    let mut key = Vec::with_capacity(ADDRESS_LENGTH + FIELD_ELEMENT_LENGTH);
    key.extend_from_slice(address.as_slice());
    key.extend_from_slice(&nullifier.to_bytes());
    key
}

fn decode_address(bytes: &[u8]) -> DbResult<Address> {
    if bytes.len() != ADDRESS_LENGTH {
        return Err(DbError::Serialization(format!(
            "invalid address key length {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(bytes))
}

fn load_amounts(tree: &Tree) -> DbResult<Vec<(Address, U256)>> {
    let mut out = Vec::new();
    for entry in tree.iter() {
        let (key, value) = entry?;
        let address = decode_address(&key)?;
        let raw: [u8; 32] = value
            .as_ref()
            .try_into()
            .map_err(|_| DbError::Serialization("invalid amount bytes".to_string()))?;
        out.push((address, U256::from_be_bytes(raw)));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::state::RecoveryMode;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        let mut account = AccountState::new(addr(0xa1));
        account.execution_nonce = U256::from(3u64);
        account.recovery_mode = Some(RecoveryMode::ZkCommitment {
            commitment: FieldElement::from_word("mango"),
        });
        ledger.insert_account(addr(1), account);

        let mut signer_mode = AccountState::new(addr(0xa2));
        signer_mode.recovery_mode = Some(RecoveryMode::Signature { guardian: addr(0xb2) });
        signer_mode.recovery_nonce = U256::from(1u64);
        ledger.insert_account(addr(2), signer_mode);

        ledger.consume_nullifier(addr(1), FieldElement::from_u64(11));
        ledger.consume_nullifier(addr(1), FieldElement::from_u64(12));
        ledger.credit(addr(1), U256::from(1_000u64)).unwrap();
        ledger.credit_deposit(addr(1), U256::from(5_000u64)).unwrap();
        ledger
    }

    #[test]
    fn open_temporary_database() {
        let db = LedgerDb::open_temporary().expect("should create temp db");
        assert_eq!(db.account_count(), 0);
        assert_eq!(db.state_root().unwrap(), None);
        assert_eq!(db.load_ledger().unwrap(), Ledger::new());
    }

    #[test]
    fn save_and_load_round_trip() {
        let db = LedgerDb::open_temporary().unwrap();
        let ledger = sample_ledger();
        db.save_ledger(&ledger).unwrap();

        assert_eq!(db.account_count(), 2);
        assert_eq!(db.nullifier_count(), 2);
        assert_eq!(db.load_ledger().unwrap(), ledger);
        assert_eq!(db.state_root().unwrap(), Some(ledger.state_root()));
    }

    #[test]
    fn save_removes_stale_entries() {
        let db = LedgerDb::open_temporary().unwrap();
        let mut ledger = sample_ledger();
        db.save_ledger(&ledger).unwrap();

        ledger.debit(addr(1), U256::from(1_000u64)).unwrap();
        db.save_ledger(&ledger).unwrap();

        let loaded = db.load_ledger().unwrap();
        assert_eq!(loaded.balance(&addr(1)), U256::ZERO);
        assert_eq!(loaded, ledger);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = sample_ledger();
        {
            let db = LedgerDb::open(dir.path()).expect("should open db");
            db.save_ledger(&ledger).unwrap();
        }

        let db = LedgerDb::open(dir.path()).expect("should reopen db");
        let loaded = db.load_ledger().unwrap();
        assert!(loaded
            .nullifiers()
            .contains(&addr(1), &FieldElement::from_u64(12)));
        assert_eq!(loaded.state_root(), ledger.state_root());
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let db = LedgerDb::open_temporary().unwrap();
        db.save_ledger(&sample_ledger()).unwrap();

        // Drop a consumed nullifier behind the ledger's back.
        let key = nullifier_key(&addr(1), &FieldElement::from_u64(11));
        db.nullifiers.remove(key).unwrap();

        assert!(matches!(
            db.load_ledger(),
            Err(DbError::StateRootMismatch { .. })
        ));
    }

    #[test]
    fn metadata_round_trip() {
        let db = LedgerDb::open_temporary().unwrap();
        assert!(matches!(
            db.require_metadata("account"),
            Err(DbError::NotFound(_))
        ));
        db.put_metadata("account", addr(7).as_slice()).unwrap();
        assert_eq!(db.require_metadata("account").unwrap(), addr(7).to_vec());
    }
}
