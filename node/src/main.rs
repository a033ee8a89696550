// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Aegis Node
//!
//! Entry point for the `aegis-node` binary: a local operator tool that runs
//! the whole guardian-recovery flow against a ledger kept on disk.
//!
//! - `init`         — owner key, Groth16 keys, chain config, deployed account
//! - `commitment`   — print `FieldHash(secret_key, answer)`
//! - `set-guardian` — register a guardian commitment or address
//! - `prove`        — emit a recovery package for a new owner
//! - `guardian-sign` — sign a guardian approval for a new owner
//! - `recover`      — verify a package or approval and rotate the owner
//! - `deposit`      — fund the account's gas deposit or balance
//! - `execute`      — sign a user operation and run it through the entry point
//! - `status`       — account and ledger summary
//! - `version`      — print build version information

mod cli;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aegis_contracts::account::encode_execute;
use aegis_contracts::recovery::recovery_digest;
use aegis_contracts::{
    AccountCall, EntryPoint, OpOutcome, OpStatus, RecoveryRequest, SmartAccountFactory,
    UserOperation,
};
use aegis_protocol::config::ChainConfig;
use aegis_protocol::crypto::{Keypair, RecoverableSignature};
use aegis_protocol::storage::{Ledger, LedgerDb, RecoveryMode};
use aegis_protocol::zkp::{FieldElement, GuardianSecret, RecoveryProver, RecoveryVerifier};
use alloy_primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use cli::{AegisNodeCli, Commands};
use logging::LogFormat;

/// Metadata key holding the deployed account's address.
const ACCOUNT_METADATA_KEY: &str = "account";

fn main() -> Result<()> {
    let cli = AegisNodeCli::parse();
    logging::init_logging(&cli.log_level, LogFormat::from_str_lossy(&cli.log_format))?;

    let dir = DataDir::new(cli.data_dir);
    match cli.command {
        Commands::Init(args) => init_node(&dir, args),
        Commands::Commitment(args) => print_commitment(args),
        Commands::SetGuardian(args) => set_guardian(&dir, args),
        Commands::Prove(args) => prove(&dir, args),
        Commands::GuardianSign(args) => guardian_sign(&dir, args),
        Commands::Recover(args) => recover(&dir, args),
        Commands::Deposit(args) => deposit(&dir, args),
        Commands::Execute(args) => execute(&dir, args),
        Commands::Status => status(&dir),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Data directory
// ---------------------------------------------------------------------------

/// File layout under `--data-dir`.
struct DataDir {
    root: PathBuf,
}

impl DataDir {
    fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn owner_key(&self) -> PathBuf {
        self.root.join("owner.key")
    }

    fn proving_key(&self) -> PathBuf {
        self.root.join("recovery.pk")
    }

    fn verifying_key(&self) -> PathBuf {
        self.root.join("recovery.vk")
    }

    fn chain_config(&self) -> PathBuf {
        self.root.join("chain.json")
    }

    fn db(&self) -> PathBuf {
        self.root.join("db")
    }

    fn load_config(&self) -> Result<ChainConfig> {
        ChainConfig::load(self.chain_config())
    }

    fn load_owner(&self) -> Result<Keypair> {
        read_key(&self.owner_key())
    }

    fn load_prover(&self) -> Result<RecoveryProver> {
        let path = self.proving_key();
        let bytes = fs::read(&path)
            .with_context(|| format!("failed to read proving key {}", path.display()))?;
        RecoveryProver::pk_from_bytes(&bytes)
    }

    fn load_verifier(&self) -> Result<RecoveryVerifier> {
        let path = self.verifying_key();
        let bytes = fs::read(&path)
            .with_context(|| format!("failed to read verifying key {}", path.display()))?;
        RecoveryVerifier::vk_from_bytes(&bytes)
    }

    fn open_db(&self) -> Result<LedgerDb> {
        let path = self.db();
        LedgerDb::open(&path)
            .with_context(|| format!("failed to open ledger database at {}", path.display()))
    }
}

/// The ledger plus the account this node manages.
struct Node {
    db: LedgerDb,
    ledger: Ledger,
    account: Address,
    config: ChainConfig,
}

impl Node {
    fn open(dir: &DataDir) -> Result<Self> {
        let config = dir.load_config()?;
        let db = dir.open_db()?;
        let ledger = db.load_ledger().context("failed to load ledger")?;
        let raw = db
            .require_metadata(ACCOUNT_METADATA_KEY)
            .context("data directory has no account; run `aegis-node init`")?;
        if raw.len() != 20 {
            bail!("stored account address is {} bytes, expected 20", raw.len());
        }
        Ok(Self {
            db,
            ledger,
            account: Address::from_slice(&raw),
            config,
        })
    }

    fn entry_point(&self, verifier: RecoveryVerifier) -> EntryPoint {
        EntryPoint::new(self.config.clone(), Arc::new(verifier))
    }

    fn owner(&self) -> Result<Address> {
        self.ledger
            .account(&self.account)
            .map(|state| state.owner)
            .with_context(|| format!("account {} missing from ledger", self.account))
    }

    /// Reject a package or approval made for a different account.
    fn ensure_account(&self, target: Address) -> Result<()> {
        if target != self.account {
            bail!("package targets {}, this node manages {}", target, self.account);
        }
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.db
            .save_ledger(&self.ledger)
            .context("failed to persist ledger")
    }
}

// ---------------------------------------------------------------------------
// Recovery package
// ---------------------------------------------------------------------------

/// What a guardian hands to whoever submits the recovery.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecoveryPackage {
    account: Address,
    nullifier_hash: FieldElement,
    zk_proof: String,
    new_owner: Address,
    current_owner: Address,
    commitment: FieldElement,
    generated_at: DateTime<Utc>,
}

impl RecoveryPackage {
    fn into_request(self) -> Result<RecoveryRequest> {
        let proof = hex::decode(self.zk_proof.trim_start_matches("0x"))
            .context("proof is not valid hex")?;
        Ok(RecoveryRequest::ZkProof {
            new_owner: self.new_owner,
            current_owner: self.current_owner,
            nullifier_hash: self.nullifier_hash,
            proof,
        })
    }
}

/// A guardian's signed approval for one owner rotation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuardianApproval {
    account: Address,
    guardian: Address,
    current_owner: Address,
    new_owner: Address,
    nonce: U256,
    signature: String,
    generated_at: DateTime<Utc>,
}

impl GuardianApproval {
    fn into_request(self) -> Result<RecoveryRequest> {
        let bytes = hex::decode(self.signature.trim_start_matches("0x"))
            .context("signature is not valid hex")?;
        let signature =
            RecoverableSignature::from_slice(&bytes).context("signature is malformed")?;
        Ok(RecoveryRequest::Signature {
            new_owner: self.new_owner,
            nonce: self.nonce,
            signature,
        })
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Creates the data directory, keys, chain config, and the smart account.
fn init_node(dir: &DataDir, args: cli::InitArgs) -> Result<()> {
    let root = &dir.root;
    tracing::info!(data_dir = %root.display(), chain_id = args.chain_id, "initializing node");

    if dir.owner_key().exists() && !args.force {
        bail!(
            "{} is already initialized; pass --force to overwrite",
            root.display()
        );
    }
    fs::create_dir_all(root)
        .with_context(|| format!("failed to create data directory: {}", root.display()))?;

    let config = ChainConfig {
        chain_id: args.chain_id,
        ..ChainConfig::default()
    };
    config.save(dir.chain_config())?;

    // Owner key.
    let owner = Keypair::generate();
    let key_path = dir.owner_key();
    fs::write(&key_path, hex::encode(owner.secret_key_bytes()))
        .with_context(|| format!("failed to write owner key to {}", key_path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o600))?;
    }

    // Groth16 keys.
    let mut rng = match args.setup_seed {
        Some(seed) => {
            tracing::warn!(seed, "deterministic Groth16 setup; keys are not secure");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let (prover, verifier) = RecoveryProver::setup(&mut rng)?;
    write_bytes(&dir.proving_key(), &prover.pk_to_bytes()?)?;
    write_bytes(&dir.verifying_key(), &verifier.vk_to_bytes()?)?;

    // Account.
    if args.force && dir.db().exists() {
        fs::remove_dir_all(dir.db())
            .with_context(|| format!("failed to clear {}", dir.db().display()))?;
    }
    let db = dir.open_db()?;
    let mut ledger = Ledger::new();
    let factory = SmartAccountFactory::new(config.factory);
    let account = factory.create_account(&mut ledger, owner.address(), U256::from(args.salt))?;
    db.save_ledger(&ledger)?;
    db.put_metadata(ACCOUNT_METADATA_KEY, account.as_slice())?;
    db.flush()?;

    tracing::info!(%account, owner = %owner.address(), "node initialized");

    println!("Node initialized successfully.");
    println!("  Data directory : {}", root.display());
    println!("  Chain id       : {}", config.chain_id);
    println!("  Account        : {}", account);
    println!("  Owner          : {}", owner.address());
    println!("  Owner key      : {}", key_path.display());
    Ok(())
}

/// Prints the guardian commitment for a secret.
fn print_commitment(args: cli::SecretArgs) -> Result<()> {
    let secret = guardian_secret(&args.secret_key, &args.answer)?;
    println!("{}", secret.commitment().to_b256());
    Ok(())
}

/// Registers a guardian on the account, signed off by the owner key.
fn set_guardian(dir: &DataDir, args: cli::SetGuardianArgs) -> Result<()> {
    let mut node = Node::open(dir)?;
    let owner = dir.load_owner()?;

    let call = if let Some(address) = &args.address {
        let guardian: Address = address.parse().context("invalid guardian address")?;
        AccountCall::SetGuardianAddress { guardian }
    } else {
        let commitment = match (&args.commitment, &args.secret_key, &args.answer) {
            (Some(c), _, _) => parse_field(c)?,
            (None, Some(sk), Some(answer)) => guardian_secret(sk, answer)?.commitment(),
            _ => bail!("pass --commitment, --address, or --secret-key with --answer"),
        };
        AccountCall::SetGuardianCommitment { commitment }
    };

    let entry_point = node.entry_point(dir.load_verifier()?);
    entry_point
        .smart_account()
        .execute(&mut node.ledger, node.account, owner.address(), &call.encode())
        .context("guardian update reverted")?;
    node.commit()?;

    println!("Guardian updated for {}", node.account);
    Ok(())
}

/// Proves knowledge of the guardian secret for `current owner -> new owner`.
fn prove(dir: &DataDir, args: cli::ProveArgs) -> Result<()> {
    let node = Node::open(dir)?;
    let prover = dir.load_prover()?;
    let secret = guardian_secret(&args.secret.secret_key, &args.secret.answer)?;
    let new_owner: Address = args.new_owner.parse().context("invalid new owner address")?;
    let current_owner = node.owner()?;

    let registered = node
        .entry_point(dir.load_verifier()?)
        .get_guardian_commitment(&node.ledger, &node.account);
    if registered != Some(secret.commitment()) {
        tracing::warn!(
            account = %node.account,
            "secret does not open the registered commitment; the proof will be refused"
        );
    }

    let statement = secret.statement(new_owner, current_owner);
    let proof = prover.prove(&secret, &statement)?;
    let package = RecoveryPackage {
        account: node.account,
        nullifier_hash: statement.nullifier_hash,
        zk_proof: format!("0x{}", hex::encode(proof.as_bytes())),
        new_owner,
        current_owner,
        commitment: statement.commitment,
        generated_at: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&package).context("package serialization")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write package to {}", path.display()))?;
            tracing::info!(path = %path.display(), %new_owner, "recovery package written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Signs the EIP-712 `Recover` message for `current owner -> new owner`
/// with a guardian key.
fn guardian_sign(dir: &DataDir, args: cli::GuardianSignArgs) -> Result<()> {
    let node = Node::open(dir)?;
    let guardian = Keypair::from_hex(&args.guardian_key).context("guardian key is malformed")?;
    let new_owner: Address = args.new_owner.parse().context("invalid new owner address")?;
    let state = node
        .ledger
        .account(&node.account)
        .with_context(|| format!("account {} missing from ledger", node.account))?;

    let registered = match state.recovery_mode {
        Some(RecoveryMode::Signature { guardian: registered }) => Some(registered),
        _ => None,
    };
    if registered != Some(guardian.address()) {
        tracing::warn!(
            account = %node.account,
            guardian = %guardian.address(),
            "key is not the registered guardian; the approval will be refused"
        );
    }

    let digest = recovery_digest(
        node.config.chain_id,
        node.account,
        state.owner,
        new_owner,
        state.recovery_nonce,
    );
    let signature = guardian.sign_prehash(&digest)?;
    let approval = GuardianApproval {
        account: node.account,
        guardian: guardian.address(),
        current_owner: state.owner,
        new_owner,
        nonce: state.recovery_nonce,
        signature: format!("0x{}", hex::encode(signature.as_bytes())),
        generated_at: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&approval).context("approval serialization")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write approval to {}", path.display()))?;
            tracing::info!(path = %path.display(), %new_owner, "guardian approval written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Verifies a recovery package or guardian approval and rotates the owner.
fn recover(dir: &DataDir, args: cli::RecoverArgs) -> Result<()> {
    let mut node = Node::open(dir)?;
    let (submitter, request) = match (&args.package, &args.signature) {
        (Some(path), _) => {
            let package: RecoveryPackage = read_json(path, "recovery package")?;
            node.ensure_account(package.account)?;
            (package.new_owner, package.into_request()?)
        }
        (None, Some(path)) => {
            let approval: GuardianApproval = read_json(path, "guardian approval")?;
            node.ensure_account(approval.account)?;
            (approval.new_owner, approval.into_request()?)
        }
        (None, None) => bail!("pass --package or --signature"),
    };
    let call = AccountCall::Recover(request);

    let entry_point = node.entry_point(dir.load_verifier()?);
    entry_point
        .smart_account()
        .execute(&mut node.ledger, node.account, submitter, &call.encode())
        .context("recovery refused")?;
    node.commit()?;

    println!("Account {} recovered; owner is now {}", node.account, node.owner()?);
    Ok(())
}

/// Credits the account's entry-point deposit, or its native balance with
/// `--native`.
fn deposit(dir: &DataDir, args: cli::DepositArgs) -> Result<()> {
    let mut node = Node::open(dir)?;
    let amount = parse_amount(&args.amount)?;

    if args.native {
        node.ledger
            .credit(node.account, amount)
            .context("balance credit failed")?;
    } else {
        let entry_point = node.entry_point(dir.load_verifier()?);
        entry_point
            .deposit_to(&mut node.ledger, node.account, amount)
            .context("deposit failed")?;
    }
    node.commit()?;

    println!("Balance          : {}", node.ledger.balance(&node.account));
    println!("Deposit          : {}", node.ledger.deposit(&node.account));
    Ok(())
}

/// Wraps a call in `execute(target, value, data)`, signs it as a user
/// operation, and runs it through `handle_ops`.
fn execute(dir: &DataDir, args: cli::ExecuteArgs) -> Result<()> {
    let mut node = Node::open(dir)?;
    let signer = match &args.key_file {
        Some(path) => read_key(path)?,
        None => dir.load_owner()?,
    };
    let target: Address = args.target.parse().context("invalid target address")?;
    let value = parse_amount(&args.value)?;
    let data = match &args.data {
        Some(raw) => hex::decode(raw.trim().trim_start_matches("0x"))
            .context("call data is not valid hex")?,
        None => Vec::new(),
    };
    let beneficiary: Address = match &args.beneficiary {
        Some(raw) => raw.parse().context("invalid beneficiary address")?,
        None => signer.address(),
    };

    let entry_point = node.entry_point(dir.load_verifier()?);
    let nonce = entry_point.get_nonce(&node.ledger, &node.account);
    let mut op = UserOperation::new(node.account, nonce, encode_execute(target, value, data))
        .with_fees(args.max_fee_per_gas, args.max_priority_fee_per_gas);
    op.sign(&signer, entry_point.address(), node.config.chain_id)?;

    let outcome = entry_point
        .handle_ops(&mut node.ledger, &[op], beneficiary)
        .pop()
        .context("entry point returned no outcome")?;
    print_outcome(&outcome);

    if let OpStatus::Rejected(e) = &outcome.status {
        bail!("user operation rejected: {e}");
    }
    node.commit()
}

/// Prints the account's state and ledger summary.
fn status(dir: &DataDir) -> Result<()> {
    let node = Node::open(dir)?;
    let state = node
        .ledger
        .account(&node.account)
        .with_context(|| format!("account {} missing from ledger", node.account))?;

    let mode = match state.recovery_mode {
        None => "unrecoverable".to_string(),
        Some(RecoveryMode::Signature { guardian }) => format!("guardian signature ({guardian})"),
        Some(RecoveryMode::ZkCommitment { commitment }) => {
            format!("zk commitment ({})", commitment.to_b256())
        }
    };

    println!("Account          : {}", node.account);
    println!("Owner            : {}", state.owner);
    println!("Recovery         : {}", mode);
    println!("Execution nonce  : {}", state.execution_nonce);
    println!("Recovery nonce   : {}", state.recovery_nonce);
    println!(
        "Nullifiers spent : {}",
        node.ledger.nullifiers().count(&node.account)
    );
    println!("Balance          : {}", node.ledger.balance(&node.account));
    println!("Deposit          : {}", node.ledger.deposit(&node.account));
    println!("Chain id         : {}", node.config.chain_id);
    println!("State root       : 0x{}", hex::encode(node.ledger.state_root()));
    Ok(())
}

fn print_outcome(outcome: &OpOutcome) {
    let status = match &outcome.status {
        OpStatus::Executed => "executed".to_string(),
        OpStatus::Reverted(e) => format!("reverted: {e}"),
        OpStatus::Rejected(e) => format!("rejected: {e}"),
    };
    println!("User op hash     : {}", outcome.user_op_hash);
    println!("Sender           : {}", outcome.sender);
    println!("Status           : {}", status);
    println!("Gas used         : {}", outcome.actual_gas_used);
    println!("Gas cost         : {}", outcome.actual_gas_cost);
}

/// Prints version information to stdout.
fn print_version() {
    println!("aegis-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", aegis_protocol::config::PROTOCOL_VERSION);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn read_key(path: &Path) -> Result<Keypair> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read key {}", path.display()))?;
    Keypair::from_hex(raw.trim())
        .with_context(|| format!("key in {} is malformed", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed {what}"))
}

/// Parse a decimal or `0x`-prefixed hex wei amount.
fn parse_amount(s: &str) -> Result<U256> {
    s.trim()
        .parse()
        .with_context(|| format!("`{}` is not an amount", s.trim()))
}

fn guardian_secret(secret_key: &str, answer: &str) -> Result<GuardianSecret> {
    Ok(GuardianSecret::with_answer(parse_field(secret_key)?, answer))
}

/// Parse a decimal or `0x`-prefixed hex field element.
fn parse_field(s: &str) -> Result<FieldElement> {
    s.parse()
        .with_context(|| format!("`{}` is not a field element", s.trim()))
}
