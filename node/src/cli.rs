//! # CLI Interface
//!
//! Defines the command-line argument structure for `solera-node` using
//! `clap` derive. Supports four subcommands: `run`, `init`, `status`,
//! and `version`.

use clap::{Parser, Subcommand};
use solera_ledger::config;
use std::path::PathBuf;

/// Solera deposit-ledger node.
///
/// Serves one deployment of the Solera deposit program: the collateral
/// ledger, the rebasing token, the lock vault, and the bridge sink, behind
/// a REST/WebSocket API with Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "solera-node",
    about = "Solera deposit-ledger node",
    version,
    propagate_version = true
)]
pub struct SoleraNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Solera node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node: load (or bootstrap) the snapshot and serve the API.
    Run(RunArgs),
    /// Initialize a deployment — bootstraps a fresh snapshot on disk.
    Init(InitArgs),
    /// Query the status of a running node via its RPC endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the deployment snapshot. Loaded at boot when it exists;
    /// otherwise a fresh deployment is bootstrapped and written here.
    #[arg(long, short = 's', env = "SOLERA_STATE", default_value = "solera-state.json")]
    pub state_path: PathBuf,

    /// Port for the REST/WebSocket API.
    #[arg(long, env = "SOLERA_RPC_PORT", default_value_t = config::DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "SOLERA_METRICS_PORT", default_value_t = config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Network to bootstrap when no snapshot exists: mainnet, testnet,
    /// or devnet. Ignored when a snapshot is loaded — the snapshot wins.
    #[arg(long, default_value = "devnet")]
    pub network: String,

    /// Governor address (Bech32) for a fresh bootstrap.
    ///
    /// Required when no snapshot exists yet; ignored otherwise.
    #[arg(long, env = "SOLERA_GOVERNOR")]
    pub governor: Option<String>,

    /// Rate-setter address (Bech32) for a fresh bootstrap.
    ///
    /// Required when no snapshot exists yet; ignored otherwise.
    #[arg(long, env = "SOLERA_RATE_SETTER")]
    pub rate_setter: Option<String>,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "SOLERA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to write the bootstrapped snapshot to.
    #[arg(long, short = 's', env = "SOLERA_STATE", default_value = "solera-state.json")]
    pub state_path: PathBuf,

    /// Network to bootstrap: mainnet, testnet, or devnet.
    #[arg(long, default_value = "devnet")]
    pub network: String,

    /// Governor address (Bech32). Holds the freeze, redemption-window,
    /// and bridge authorities.
    #[arg(long)]
    pub governor: String,

    /// Rate-setter address (Bech32). Holds the rebase and display
    /// authorities.
    #[arg(long)]
    pub rate_setter: String,

    /// Overwrite an existing snapshot instead of refusing.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// RPC endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:9750")]
    pub rpc_url: String,
}
