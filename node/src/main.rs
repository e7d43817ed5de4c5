// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Solera Deposit-Ledger Node
//!
//! Entry point for the `solera-node` binary. Parses CLI arguments,
//! initializes logging and metrics, loads (or bootstraps) the deployment
//! snapshot, and serves the HTTP/WS API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — serve a deployment over REST and WebSocket
//! - `init`    — bootstrap a fresh deployment snapshot
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{broadcast, RwLock};

use solera_ledger::config;
use solera_ledger::identity::Address;
use solera_vault::deployment::{Deployment, DeploymentConfig};

use cli::{Commands, SoleraNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;
use store::SnapshotStore;

/// Broadcast channel capacity for live event streaming.
/// 256 is large enough to absorb short bursts without dropping events
/// for connected WebSocket clients.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SoleraNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full node: loads or bootstraps the deployment, then serves
/// the API and metrics endpoints until a shutdown signal arrives.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "solera_node=info,solera_vault=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        state_path = %args.state_path.display(),
        "starting solera-node"
    );

    // --- Deployment state ---
    let store = SnapshotStore::new(&args.state_path);
    let deployment = if store.exists() {
        let deployment = store
            .load()
            .context("failed to load the deployment snapshot")?;
        tracing::info!(
            network = %config::network_name(deployment.network()),
            holders = deployment.token().holder_count(),
            "snapshot loaded"
        );
        deployment
    } else {
        let (Some(governor), Some(rate_setter)) = (&args.governor, &args.rate_setter) else {
            anyhow::bail!(
                "no snapshot at {}; bootstrapping a fresh deployment requires \
                 --governor and --rate-setter",
                args.state_path.display()
            );
        };
        let governor = Address::from_bech32(governor)
            .with_context(|| format!("invalid governor address '{governor}'"))?;
        let rate_setter = Address::from_bech32(rate_setter)
            .with_context(|| format!("invalid rate-setter address '{rate_setter}'"))?;
        let network = config::network_id(&args.network)
            .with_context(|| format!("unknown network '{}'", args.network))?;

        let deployment = Deployment::bootstrap(
            DeploymentConfig::for_network(network, governor, rate_setter),
            api::wall_now(),
        );
        store
            .save(&deployment)
            .context("failed to write the initial snapshot")?;
        tracing::info!(network = %args.network, "bootstrapped a fresh deployment");
        deployment
    };

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());
    node_metrics.observe_deployment(&deployment, api::wall_now());

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            config::PROTOCOL_VERSION,
        ),
        network: deployment.network(),
        deployment: Arc::new(RwLock::new(deployment)),
        store: Arc::new(store),
        event_tx,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind the API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind the metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    // Every applied mutation already wrote a snapshot; one more on the way
    // out captures anything that landed while the servers were draining.
    let deployment = app_state.deployment.read().await;
    if let Err(e) = app_state.store.save(&deployment) {
        tracing::error!("failed to write the shutdown snapshot: {e:#}");
    }

    tracing::info!("solera-node stopped");
    Ok(())
}

/// Bootstraps a fresh deployment snapshot without starting the servers.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("solera_node=info", LogFormat::Pretty);

    let store = SnapshotStore::new(&args.state_path);
    if store.exists() && !args.force {
        anyhow::bail!(
            "snapshot already exists at {}; pass --force to overwrite it",
            store.path().display()
        );
    }

    let governor = Address::from_bech32(&args.governor)
        .with_context(|| format!("invalid governor address '{}'", args.governor))?;
    let rate_setter = Address::from_bech32(&args.rate_setter)
        .with_context(|| format!("invalid rate-setter address '{}'", args.rate_setter))?;
    let network = config::network_id(&args.network)
        .with_context(|| format!("unknown network '{}'", args.network))?;

    let deployment = Deployment::bootstrap(
        DeploymentConfig::for_network(network, governor, rate_setter),
        api::wall_now(),
    );
    store
        .save(&deployment)
        .context("failed to write the initial snapshot")?;

    tracing::info!(
        network = %args.network,
        path = %store.path().display(),
        "deployment bootstrapped"
    );

    println!("Deployment initialized.");
    println!("  Network      : {}", args.network);
    println!("  Snapshot     : {}", store.path().display());
    println!(
        "  Token        : {} ({})",
        deployment.token().name(),
        deployment.token().symbol()
    );
    println!("  Governor     : {}", governor);
    println!("  Rate setter  : {}", rate_setter);

    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body = http_get_text(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP GET without pulling in a client crate. Good enough for
/// the one-shot status subcommand against a local node.
async fn http_get_text(url: &str) -> Result<String> {
    let parsed: url::Url = url
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid URL: {}", e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("missing host in URL"))?;
    let port = parsed.port().unwrap_or(80);
    let path = parsed.path();

    let addr = format!("{}:{}", host, port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("solera-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", config::PROTOCOL_VERSION);
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Minimal URL parser, just enough to extract host, port, and path for
/// [`http_get_text`]. Keeps the `url` crate out of the dependency tree
/// for a single call site.
mod url {
    pub struct Url {
        host: String,
        port: Option<u16>,
        path: String,
    }

    impl Url {
        pub fn host_str(&self) -> Option<&str> {
            Some(&self.host)
        }

        pub fn port(&self) -> Option<u16> {
            self.port
        }

        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl std::str::FromStr for Url {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let rest = s
                .strip_prefix("http://")
                .or_else(|| s.strip_prefix("https://"))
                .unwrap_or(s);

            let (authority, path) = match rest.split_once('/') {
                Some((a, p)) => (a, format!("/{}", p)),
                None => (rest, "/".to_string()),
            };

            let (host, port) = match authority.rsplit_once(':') {
                Some((h, p)) => {
                    let p = p.parse::<u16>().map_err(|e| format!("bad port: {}", e))?;
                    (h.to_string(), Some(p))
                }
                None => (authority.to_string(), None),
            };

            Ok(Url { host, port, path })
        }
    }
}
