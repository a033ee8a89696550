//! # CLI Interface
//!
//! Defines the command-line argument structure for `aegis-node` using
//! `clap` derive. Every subcommand works against one data directory:
//!
//! ```text
//! <data-dir>/
//!   owner.key      hex secp256k1 secret of the account owner
//!   recovery.pk    Groth16 proving key (guardian side)
//!   recovery.vk    Groth16 verifying key (chain side)
//!   chain.json     ChainConfig
//!   db/            sled ledger
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Aegis guardian-recovery node.
///
/// Deploys a smart account, enrolls a guardian commitment, and lets the
/// guardian prove knowledge of its secret to rotate the account's owner.
#[derive(Parser, Debug)]
#[command(
    name = "aegis-node",
    about = "Aegis guardian-recovery node",
    version,
    propagate_version = true
)]
pub struct AegisNodeCli {
    /// Path to the node data directory.
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "AEGIS_DATA_DIR",
        default_value = ".aegis"
    )]
    pub data_dir: PathBuf,

    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "AEGIS_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(
        long,
        global = true,
        default_value = "aegis_node=info,aegis_protocol=info,aegis_contracts=info"
    )]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Aegis node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, an owner key, the Groth16 keys, and a
    /// deployed smart account.
    Init(InitArgs),
    /// Print the commitment for a guardian secret.
    Commitment(SecretArgs),
    /// Register a guardian (commitment or address) on the account.
    SetGuardian(SetGuardianArgs),
    /// Produce a recovery package proving knowledge of the guardian secret.
    Prove(ProveArgs),
    /// Sign a guardian approval for moving the account to a new owner.
    GuardianSign(GuardianSignArgs),
    /// Submit a recovery package or guardian signature and rotate the
    /// account's owner.
    Recover(RecoverArgs),
    /// Fund the account's entry-point deposit or its native balance.
    Deposit(DepositArgs),
    /// Sign a user operation and run it through the entry point.
    Execute(ExecuteArgs),
    /// Show the account and ledger state.
    Status,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Chain id for user-operation hashes and EIP-712 domains.
    #[arg(long, default_value_t = aegis_protocol::config::DEFAULT_CHAIN_ID)]
    pub chain_id: u64,

    /// Salt for the deterministic account address.
    #[arg(long, default_value_t = 0)]
    pub salt: u64,

    /// Seed for the Groth16 setup. Random when omitted.
    ///
    /// **Development only.** Anyone who knows the seed can forge proofs.
    #[arg(long)]
    pub setup_seed: Option<u64>,

    /// Overwrite an existing data directory.
    #[arg(long)]
    pub force: bool,
}

/// A guardian secret: `FieldHash(secret_key, secret_answer)` is the
/// commitment.
#[derive(Args, Debug, Clone)]
pub struct SecretArgs {
    /// Guardian secret key: decimal, or 0x-prefixed 32-byte hex.
    #[arg(long, env = "AEGIS_GUARDIAN_SECRET")]
    pub secret_key: String,

    /// Guardian secret answer (hashed into a field element).
    #[arg(long, env = "AEGIS_GUARDIAN_ANSWER")]
    pub answer: String,
}

/// Arguments for the `set-guardian` subcommand.
#[derive(Args, Debug)]
pub struct SetGuardianArgs {
    /// Commitment to register (0x-prefixed hex). Mutually exclusive with
    /// `--address` and the secret flags.
    #[arg(long, conflicts_with_all = ["address", "secret_key"])]
    pub commitment: Option<String>,

    /// Guardian address for signature-mode recovery.
    #[arg(long, conflicts_with = "secret_key")]
    pub address: Option<String>,

    /// Guardian secret key, to compute the commitment locally.
    #[arg(long, requires = "answer")]
    pub secret_key: Option<String>,

    /// Guardian secret answer.
    #[arg(long, requires = "secret_key")]
    pub answer: Option<String>,
}

/// Arguments for the `prove` subcommand.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// The guardian secret.
    #[command(flatten)]
    pub secret: SecretArgs,

    /// Address of the owner to install.
    #[arg(long)]
    pub new_owner: String,

    /// Where to write the recovery package. Stdout when omitted.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for the `guardian-sign` subcommand.
#[derive(Args, Debug)]
pub struct GuardianSignArgs {
    /// Guardian secp256k1 secret key (hex).
    #[arg(long, env = "AEGIS_GUARDIAN_KEY")]
    pub guardian_key: String,

    /// Address of the owner to install.
    #[arg(long)]
    pub new_owner: String,

    /// Where to write the signed approval. Stdout when omitted.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for the `recover` subcommand. Exactly one source is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RecoverArgs {
    /// Recovery package produced by `prove`.
    #[arg(long, short = 'p')]
    pub package: Option<PathBuf>,

    /// Guardian approval produced by `guardian-sign`.
    #[arg(long, short = 's')]
    pub signature: Option<PathBuf>,
}

/// Arguments for the `deposit` subcommand.
#[derive(Args, Debug)]
pub struct DepositArgs {
    /// Amount in wei: decimal, or 0x-prefixed hex.
    #[arg(long)]
    pub amount: String,

    /// Credit the account's own balance instead of its gas deposit.
    #[arg(long)]
    pub native: bool,
}

/// Arguments for the `execute` subcommand.
#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Call target.
    #[arg(long)]
    pub target: String,

    /// Wei to send with the call.
    #[arg(long, default_value = "0")]
    pub value: String,

    /// Hex call data for the target.
    #[arg(long)]
    pub data: Option<String>,

    /// Signing key file. Defaults to the data directory's owner key.
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Fee recipient. Defaults to the signer's address.
    #[arg(long)]
    pub beneficiary: Option<String>,

    /// Maximum fee per gas, in wei.
    #[arg(long, default_value_t = 1)]
    pub max_fee_per_gas: u128,

    /// Maximum priority fee per gas, in wei.
    #[arg(long, default_value_t = 1)]
    pub max_priority_fee_per_gas: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        AegisNodeCli::command().debug_assert();
    }

    #[test]
    fn parses_prove_with_global_flags() {
        let cli = AegisNodeCli::try_parse_from([
            "aegis-node",
            "prove",
            "--secret-key",
            "1",
            "--answer",
            "mango",
            "--new-owner",
            "0x0202020202020202020202020202020202020202",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, "json");
        match cli.command {
            Commands::Prove(args) => {
                assert_eq!(args.secret.answer, "mango");
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn set_guardian_modes_are_exclusive() {
        let both = AegisNodeCli::try_parse_from([
            "aegis-node",
            "set-guardian",
            "--commitment",
            "0x01",
            "--address",
            "0x0202020202020202020202020202020202020202",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn recover_takes_exactly_one_source() {
        let none = AegisNodeCli::try_parse_from(["aegis-node", "recover"]);
        assert!(none.is_err());

        let both = AegisNodeCli::try_parse_from([
            "aegis-node",
            "recover",
            "--package",
            "package.json",
            "--signature",
            "approval.json",
        ]);
        assert!(both.is_err());

        let cli =
            AegisNodeCli::try_parse_from(["aegis-node", "recover", "-s", "approval.json"]).unwrap();
        match cli.command {
            Commands::Recover(args) => {
                assert!(args.package.is_none());
                assert_eq!(args.signature, Some(PathBuf::from("approval.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn execute_defaults() {
        let cli = AegisNodeCli::try_parse_from([
            "aegis-node",
            "execute",
            "--target",
            "0x7777777777777777777777777777777777777777",
        ])
        .unwrap();
        match cli.command {
            Commands::Execute(args) => {
                assert_eq!(args.value, "0");
                assert!(args.data.is_none());
                assert!(args.key_file.is_none());
                assert_eq!(args.max_fee_per_gas, 1);
                assert_eq!(args.max_priority_fee_per_gas, 1);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn guardian_sign_needs_a_key() {
        let missing = AegisNodeCli::try_parse_from([
            "aegis-node",
            "guardian-sign",
            "--new-owner",
            "0x0202020202020202020202020202020202020202",
        ]);
        assert!(missing.is_err());
    }
}
