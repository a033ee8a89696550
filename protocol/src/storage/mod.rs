//! # Storage Module
//!
//! The ledger every component reads and writes, and its on-disk snapshot.
//!
//! ## Architecture
//!
//! ```text
//! state.rs  AccountState, RecoveryMode, NullifierLedger, Ledger, Checkpoint, SharedLedger
//! db.rs     sled persistence with one named tree per ledger map
//! ```
//!
//! ## Design Decisions
//!
//! 1. **One explicit store object.** Accounts, nullifiers, balances and
//!    deposits live in a single `Ledger`. There is no ambient global state,
//!    so tests build a ledger, run a transition, and compare roots.
//!
//! 2. **BLAKE3 for the state root.** It is not consensus-visible, only a
//!    cheap integrity check and a way to assert "nothing changed".
//!
//! 3. **Undo journal, not snapshots.** Rolling back a failed operation
//!    replays the few values it overwrote instead of copying the ledger.
//!
//! 4. **Bincode for on-disk serialization.** Compact and fast. JSON is for
//!    the CLI and debugging; bincode is for storage.

pub mod db;
pub mod state;

pub use db::{DbError, DbResult, LedgerDb};
pub use state::{
    AccountState, Checkpoint, Ledger, LedgerError, NullifierLedger, RecoveryMode, SharedLedger,
};
