//! # Aegis Account Contracts
//!
//! Account-layer logic for Aegis, written as plain state transitions over an
//! [`aegis_protocol::storage::Ledger`] instead of EVM bytecode:
//!
//! - **Registry**: which guardian, if any, may recover an account.
//! - **Recovery**: ownership rotation by zero-knowledge proof or by
//!   guardian signature, with nullifier replay protection.
//! - **Smart Account**: call dispatch, owner authorization and gas metering.
//! - **Entry Point**: batched user-operation validation, execution and fee
//!   settlement.
//! - **Factory**: deterministic account deployment.
//!
//! ## Design Principles
//!
//! 1. Validate everything, then write. A refused request never leaves a
//!    partial update behind.
//! 2. Every balance change uses checked arithmetic.
//! 3. Modes are enum variants, not boolean flags.
//! 4. Signatures and proofs gate every ownership change.

pub mod account;
pub mod entry_point;
pub mod factory;
pub mod recovery;
pub mod registry;
pub mod user_operation;

pub use account::{AccountCall, ExecutionError, GasMeter, SmartAccount};
pub use entry_point::{DepositError, EntryPoint, OpError, OpOutcome, OpStatus};
pub use factory::{FactoryError, SmartAccountFactory};
pub use recovery::{Recovered, RecoveryCoordinator, RecoveryError, RecoveryRequest};
pub use registry::RegistryError;
pub use user_operation::UserOperation;
