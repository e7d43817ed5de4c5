//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the deposit-program node's HTTP
//! interface. All endpoints share application state through axum's `State`
//! extractor; mutations take the deployment write lock, apply, refresh the
//! gauges, persist a snapshot, and broadcast an event, in that order.
//!
//! Callers identify themselves with a `caller` address in each mutation
//! payload. The node applies the same role checks the library enforces —
//! it is an accounting service fronting the deployment, not a signature
//! boundary.
//!
//! ## Endpoints
//!
//! | Method | Path                 | Description                              |
//! |--------|----------------------|------------------------------------------|
//! | GET    | `/health`            | Liveness probe                           |
//! | GET    | `/status`            | Deployment status summary                |
//! | GET    | `/rate`              | Share rate and rebase schedule           |
//! | GET    | `/accounts/:address` | Collateral, shares, and designation      |
//! | GET    | `/bridge/tickets`    | Every bridge ticket issued so far        |
//! | GET    | `/ws`                | WebSocket for live deployment events     |
//! | POST   | `/deposit`           | Deposit collateral into the vault        |
//! | POST   | `/redesignate`       | Replace the caller's bridge designation  |
//! | POST   | `/redeem`            | Redeem display balance for collateral    |
//! | POST   | `/rebase/rate`       | Arm a rebase toward an explicit rate     |
//! | POST   | `/rebase/apr`        | Arm a rebase from a yearly rate          |
//! | POST   | `/bridge`            | Forward custody to the bridge sink       |
//! | POST   | `/admin/freeze`      | Pause or resume deposits                 |
//! | POST   | `/admin/redemptions` | Open or close the redemption window      |
//! | POST   | `/admin/display`     | Toggle display suppression               |
//! | POST   | `/admin/governor`    | Hand the governor role to a new address  |
//! | POST   | `/faucet`            | Mint devnet collateral (never mainnet)   |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use solera_ledger::config;
use solera_ledger::identity::Address;
use solera_ledger::rate::{Rate, Timestamp};
use solera_ledger::shares::{Assets, Shares};
use solera_vault::base_asset::BaseAsset;
use solera_vault::bridge::{BridgeTicket, Destination};
use solera_vault::deployment::{Deployment, DeploymentStatus};
use solera_vault::lock_vault::VaultError;
use solera_vault::rebasing_token::TokenError;

use crate::metrics::SharedMetrics;
use crate::store::SnapshotStore;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Network identifier of the served deployment.
    pub network: u32,
    /// The deployment this node serves. One write lock per mutation.
    pub deployment: Arc<RwLock<Deployment>>,
    /// Snapshot persistence; written after every successful mutation.
    pub store: Arc<SnapshotStore>,
    /// Broadcast channel for live event notifications.
    pub event_tx: broadcast::Sender<NodeEvent>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeEvent {
    /// A deposit landed in the vault.
    #[serde(rename = "deposit")]
    Deposit {
        depositor: String,
        amount: Assets,
        shares_minted: Shares,
        destination: String,
    },
    /// A depositor replaced their bridge designation.
    #[serde(rename = "redesignate")]
    Redesignate { account: String, destination: String },
    /// A holding was redeemed for collateral.
    #[serde(rename = "redeem")]
    Redeem {
        redeemer: String,
        recipient: String,
        paid_out: Assets,
        shares_burned: Shares,
    },
    /// A rebase schedule was armed.
    #[serde(rename = "rebase")]
    Rebase {
        anchored_rate: Rate,
        target_rate: Rate,
        update_end: Timestamp,
    },
    /// Custody was forwarded to the bridge sink.
    #[serde(rename = "bridge_transfer")]
    BridgeTransfer {
        ticket_id: String,
        destination: String,
        amount: Assets,
    },
    /// A governance gate moved (freeze, redemption window, or display).
    #[serde(rename = "gate_change")]
    GateChange {
        frozen: bool,
        redemptions_open: bool,
        display_suppressed: bool,
    },
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rate", get(rate_handler))
        .route("/ws", get(ws_handler))
        .route("/accounts/:address", get(account_handler))
        .route("/bridge/tickets", get(bridge_tickets_handler))
        .route("/deposit", post(deposit_handler))
        .route("/redesignate", post(redesignate_handler))
        .route("/redeem", post(redeem_handler))
        .route("/rebase/rate", post(rebase_rate_handler))
        .route("/rebase/apr", post(rebase_apr_handler))
        .route("/bridge", post(bridge_handler))
        .route("/admin/freeze", post(freeze_handler))
        .route("/admin/redemptions", post(redemptions_handler))
        .route("/admin/display", post(display_handler))
        .route("/admin/governor", post(governor_handler))
        .route("/faucet", post(faucet_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request Types
// ---------------------------------------------------------------------------

/// Request payload for `POST /deposit`.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    /// Bech32 address of the depositor.
    pub caller: String,
    /// Collateral to deposit, in base units.
    pub amount: Assets,
    /// Hex destination on the receiving chain.
    pub destination: String,
}

/// Request payload for `POST /redesignate`.
#[derive(Debug, Deserialize)]
pub struct RedesignateRequest {
    /// Bech32 address whose designation changes.
    pub caller: String,
    /// Hex destination on the receiving chain.
    pub destination: String,
}

/// Request payload for `POST /redeem`.
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    /// Bech32 address of the redeemer.
    pub caller: String,
    /// Bech32 address the collateral is paid to.
    pub to: String,
    /// Display amount to redeem.
    pub amount: Assets,
}

/// Request payload for `POST /rebase/rate`.
#[derive(Debug, Deserialize)]
pub struct RebaseRateRequest {
    /// Bech32 address of the rate setter.
    pub caller: String,
    /// The rate the schedule settles at, in fixed-point rate units.
    pub target_rate: Rate,
    /// Unix seconds at which the schedule settles.
    pub update_end: Timestamp,
}

/// Request payload for `POST /rebase/apr`.
#[derive(Debug, Deserialize)]
pub struct RebaseAprRequest {
    /// Bech32 address of the rate setter.
    pub caller: String,
    /// Yearly rate of increase, in fixed-point rate units.
    pub apr: Rate,
    /// Unix seconds at which the schedule settles.
    pub update_end: Timestamp,
}

/// Request payload for `POST /bridge`.
#[derive(Debug, Deserialize)]
pub struct BridgeRequest {
    /// Bech32 address of the governor.
    pub caller: String,
    /// Hex destination on the receiving chain.
    pub destination: String,
    /// Collateral to forward. Omit to sweep the full custody balance.
    pub amount: Option<Assets>,
}

/// Request payload for `POST /admin/freeze`.
#[derive(Debug, Deserialize)]
pub struct FreezeRequest {
    /// Bech32 address of the governor.
    pub caller: String,
    /// `true` to pause deposits and redesignations.
    pub frozen: bool,
}

/// Request payload for `POST /admin/redemptions`.
#[derive(Debug, Deserialize)]
pub struct RedemptionsRequest {
    /// Bech32 address of the governor.
    pub caller: String,
    /// `true` to open the redemption window.
    pub open: bool,
}

/// Request payload for `POST /admin/display`.
#[derive(Debug, Deserialize)]
pub struct DisplayRequest {
    /// Bech32 address of the rate setter.
    pub caller: String,
    /// `true` to make every per-holder balance read zero.
    pub suppressed: bool,
}

/// Request payload for `POST /admin/governor`.
#[derive(Debug, Deserialize)]
pub struct GovernorRequest {
    /// Bech32 address of the current governor.
    pub caller: String,
    /// Bech32 address of the new governor.
    pub new_governor: String,
}

/// Request payload for `POST /faucet`.
#[derive(Debug, Deserialize)]
pub struct FaucetRequest {
    /// Bech32 address to credit.
    pub account: String,
    /// Collateral to mint, in base units.
    pub amount: Assets,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Program generation fingerprint.
    pub fingerprint: String,
    /// The deployment summary.
    #[serde(flatten)]
    pub deployment: DeploymentStatus,
}

/// Response payload for `GET /rate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RateResponse {
    /// The live share rate.
    pub current_rate: Rate,
    /// The anchor of the current segment.
    pub anchored_rate: Rate,
    /// The rate the current segment settles at.
    pub target_rate: Rate,
    /// When the current segment was armed.
    pub update_start: Timestamp,
    /// When the current segment settles.
    pub update_end: Timestamp,
    /// "flat", "interpolating", or "settled".
    pub phase: String,
    /// The rate at which one share is exactly one asset unit.
    pub base: Rate,
}

/// Response payload for `GET /accounts/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    /// Bech32 account address.
    pub address: String,
    /// Base asset held outside the vault.
    pub collateral: Assets,
    /// Shares held in the rebasing token.
    pub shares: Shares,
    /// Display balance at the live rate. Zero while display is suppressed.
    pub display_balance: Assets,
    /// Hex bridge designation, if one is on record.
    pub designation: Option<String>,
}

/// Response payload for the three `/admin` gate toggles.
#[derive(Debug, Serialize, Deserialize)]
pub struct GateResponse {
    /// Whether deposits and redesignations are paused.
    pub frozen: bool,
    /// Whether the redemption window is open.
    pub redemptions_open: bool,
    /// Whether per-holder balances currently read zero.
    pub display_suppressed: bool,
}

/// Response payload for `POST /admin/governor`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GovernorResponse {
    /// Bech32 address now holding the governor role.
    pub governor: String,
}

/// Response payload for `POST /faucet`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FaucetResponse {
    /// Bech32 address that was credited.
    pub account: String,
    /// Collateral minted by this call.
    pub minted: Assets,
    /// The account's collateral balance after the mint.
    pub balance: Assets,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Shared Handler Plumbing
// ---------------------------------------------------------------------------

/// The node's clock: wall time as Unix seconds. The accounting layer is
/// timestamp-driven, so this is the single place the node reads a clock.
pub(crate) fn wall_now() -> Timestamp {
    chrono::Utc::now().timestamp().max(0) as Timestamp
}

/// Rejects a call: counts it and renders the JSON error body.
fn reject(state: &AppState, status: StatusCode, message: String) -> Response {
    state.metrics.rejected_calls_total.inc();
    tracing::debug!(status = %status, "call rejected: {message}");
    (status, Json(ErrorResponse { error: message })).into_response()
}

/// Parses a Bech32 address field, mapping failure to a counted 400.
fn parse_address(state: &AppState, field: &str, raw: &str) -> Result<Address, Response> {
    Address::from_bech32(raw)
        .map_err(|e| reject(state, StatusCode::BAD_REQUEST, format!("invalid {field}: {e}")))
}

/// Parses a hex destination field, mapping failure to a counted 400.
fn parse_destination(state: &AppState, field: &str, raw: &str) -> Result<Destination, Response> {
    Destination::from_hex(raw)
        .map_err(|e| reject(state, StatusCode::BAD_REQUEST, format!("invalid {field}: {e}")))
}

/// Maps a refused vault operation to its HTTP status.
///
/// Role failures are 403. The two governance gates are 409 — the request
/// was well-formed but the deployment is in a state that refuses it.
/// Everything else the library rejects is a 400.
fn vault_error_status(err: &VaultError) -> StatusCode {
    match err {
        VaultError::Role(_) => StatusCode::FORBIDDEN,
        VaultError::LockPeriodEnded | VaultError::InvalidRedemptionPeriod => StatusCode::CONFLICT,
        VaultError::Token(e) => token_error_status(e),
        VaultError::InsufficientCustody { .. }
        | VaultError::NullAddress
        | VaultError::Asset(_)
        | VaultError::Bridge(_) => StatusCode::BAD_REQUEST,
    }
}

/// Maps a refused token operation to its HTTP status.
fn token_error_status(err: &TokenError) -> StatusCode {
    match err {
        TokenError::Role(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Persists the snapshot after a successful mutation. The mutation is
/// already applied in memory; a failed write is logged and the call still
/// reports success.
fn persist(state: &AppState, deployment: &Deployment) {
    if let Err(e) = state.store.save(deployment) {
        tracing::error!("failed to persist snapshot: {e:#}");
    }
}

/// The post-mutation tail every write handler shares: refresh gauges,
/// write the snapshot, broadcast the event.
fn finish_mutation(state: &AppState, deployment: &Deployment, now: Timestamp, event: NodeEvent) {
    state.metrics.observe_deployment(deployment, now);
    persist(state, deployment);
    let _ = state.event_tx.send(event);
}

// ---------------------------------------------------------------------------
// Read Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not check internal subsystem health — that
/// belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns the deployment status summary.
async fn status_handler(State(state): State<AppState>) -> Response {
    let now = wall_now();
    let deployment = state.deployment.read().await;
    match deployment.status(now) {
        Ok(status) => Json(StatusResponse {
            version: state.version.clone(),
            fingerprint: config::PROTOCOL_FINGERPRINT.to_string(),
            deployment: status,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("status unavailable: {e}"),
            }),
        )
            .into_response(),
    }
}

/// `GET /rate` — returns the live share rate and the armed schedule.
async fn rate_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = wall_now();
    let deployment = state.deployment.read().await;
    let token = deployment.token();
    let timeline = token.timeline();

    Json(RateResponse {
        current_rate: token.share_rate(now),
        anchored_rate: timeline.last_rate(),
        target_rate: timeline.next_rate(),
        update_start: timeline.update_start(),
        update_end: timeline.update_end(),
        phase: token.schedule_phase(now).to_string(),
        base: token.base(),
    })
}

/// `GET /accounts/:address` — collateral, shares, display balance, and
/// the bridge designation on record for one account.
///
/// Accounts the deployment has never seen return zeros, not 404 — an
/// address is a valid account the moment someone funds it.
async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let account = match parse_address(&state, "address", &address) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let deployment = state.deployment.read().await;
    let display_balance = match deployment.token().balance_of(&account, now) {
        Ok(b) => b,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("balance unavailable: {e}"),
                }),
            )
                .into_response();
        }
    };

    Json(AccountResponse {
        address: account.to_bech32(),
        collateral: deployment.asset().balance_of(&account),
        shares: deployment.token().shares_of(&account),
        display_balance,
        designation: deployment
            .vault()
            .designated_of(&account)
            .map(|d| d.to_string()),
    })
    .into_response()
}

/// `GET /bridge/tickets` — every ticket the sink has issued, oldest first.
async fn bridge_tickets_handler(State(state): State<AppState>) -> Json<Vec<BridgeTicket>> {
    let deployment = state.deployment.read().await;
    Json(deployment.sink().tickets().to_vec())
}

/// `GET /ws` — WebSocket upgrade for live event streaming.
///
/// Clients receive JSON-encoded [`NodeEvent`] messages for each applied
/// mutation. The connection is read-only from the server's perspective;
/// client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            // Client disconnected.
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {
                        // Client messages are ignored — this is a push-only channel.
                    }
                    _ => break, // Disconnected or error.
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Depositor Handlers
// ---------------------------------------------------------------------------

/// `POST /deposit` — pulls collateral into custody, mints matching shares,
/// and records the caller's bridge designation.
async fn deposit_handler(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let destination = match parse_destination(&state, "destination", &req.destination) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.deposit(&caller, req.amount, destination, now) {
        Ok(receipt) => {
            state.metrics.deposits_total.inc();
            finish_mutation(
                &state,
                &deployment,
                now,
                NodeEvent::Deposit {
                    depositor: receipt.depositor.to_bech32(),
                    amount: receipt.amount,
                    shares_minted: receipt.shares_minted,
                    destination: receipt.destination.to_string(),
                },
            );
            tracing::info!(
                depositor = %receipt.depositor,
                amount = receipt.amount,
                shares = receipt.shares_minted,
                "deposit accepted"
            );
            Json(receipt).into_response()
        }
        Err(e) => reject(&state, vault_error_status(&e), e.to_string()),
    }
}

/// `POST /redesignate` — replaces the caller's bridge designation.
async fn redesignate_handler(
    State(state): State<AppState>,
    Json(req): Json<RedesignateRequest>,
) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let destination = match parse_destination(&state, "destination", &req.destination) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.redesignate(&caller, destination, now) {
        Ok(receipt) => {
            finish_mutation(
                &state,
                &deployment,
                now,
                NodeEvent::Redesignate {
                    account: receipt.account.to_bech32(),
                    destination: receipt.current.to_string(),
                },
            );
            Json(receipt).into_response()
        }
        Err(e) => reject(&state, vault_error_status(&e), e.to_string()),
    }
}

/// `POST /redeem` — burns display balance and pays collateral out of
/// custody.
async fn redeem_handler(State(state): State<AppState>, Json(req): Json<RedeemRequest>) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let to = match parse_address(&state, "to", &req.to) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.redeem(&caller, &to, req.amount, now) {
        Ok(receipt) => {
            state.metrics.redemptions_total.inc();
            finish_mutation(
                &state,
                &deployment,
                now,
                NodeEvent::Redeem {
                    redeemer: receipt.redeemer.to_bech32(),
                    recipient: receipt.recipient.to_bech32(),
                    paid_out: receipt.paid_out,
                    shares_burned: receipt.shares_burned,
                },
            );
            tracing::info!(
                redeemer = %receipt.redeemer,
                paid_out = receipt.paid_out,
                "redemption paid"
            );
            Json(receipt).into_response()
        }
        Err(e) => reject(&state, vault_error_status(&e), e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Rate-Setter Handlers
// ---------------------------------------------------------------------------

/// `POST /rebase/rate` — arms a rebase toward an explicit target rate.
async fn rebase_rate_handler(
    State(state): State<AppState>,
    Json(req): Json<RebaseRateRequest>,
) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.rebase_by_rate(&caller, req.target_rate, req.update_end, now) {
        Ok(note) => {
            state.metrics.rebases_total.inc();
            finish_mutation(
                &state,
                &deployment,
                now,
                NodeEvent::Rebase {
                    anchored_rate: note.anchored_rate,
                    target_rate: note.target_rate,
                    update_end: note.update_end,
                },
            );
            tracing::info!(
                target = note.target_rate,
                end = note.update_end,
                "rebase schedule armed"
            );
            Json(note).into_response()
        }
        Err(e) => reject(&state, token_error_status(&e), e.to_string()),
    }
}

/// `POST /rebase/apr` — arms a rebase computed from a yearly rate of
/// increase over the window ending at `update_end`.
async fn rebase_apr_handler(
    State(state): State<AppState>,
    Json(req): Json<RebaseAprRequest>,
) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.rebase_by_apr(&caller, req.apr, req.update_end, now) {
        Ok(note) => {
            state.metrics.rebases_total.inc();
            finish_mutation(
                &state,
                &deployment,
                now,
                NodeEvent::Rebase {
                    anchored_rate: note.anchored_rate,
                    target_rate: note.target_rate,
                    update_end: note.update_end,
                },
            );
            tracing::info!(
                apr = req.apr,
                target = note.target_rate,
                end = note.update_end,
                "apr rebase schedule armed"
            );
            Json(note).into_response()
        }
        Err(e) => reject(&state, token_error_status(&e), e.to_string()),
    }
}

/// `POST /admin/display` — toggles display suppression on the token.
async fn display_handler(
    State(state): State<AppState>,
    Json(req): Json<DisplayRequest>,
) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.set_display_suppressed(&caller, req.suppressed) {
        Ok(()) => {
            let response = gate_response(&deployment);
            finish_mutation(&state, &deployment, now, gate_event(&deployment));
            Json(response).into_response()
        }
        Err(e) => reject(&state, token_error_status(&e), e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Governor Handlers
// ---------------------------------------------------------------------------

/// `POST /bridge` — forwards custody to the bridge sink. Omitting the
/// amount sweeps the full custody balance.
async fn bridge_handler(State(state): State<AppState>, Json(req): Json<BridgeRequest>) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let destination = match parse_destination(&state, "destination", &req.destination) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.bridge(&caller, &destination, req.amount, now) {
        Ok(ticket) => {
            state.metrics.bridge_transfers_total.inc();
            finish_mutation(
                &state,
                &deployment,
                now,
                NodeEvent::BridgeTransfer {
                    ticket_id: ticket.id.to_string(),
                    destination: ticket.destination.to_string(),
                    amount: ticket.amount,
                },
            );
            tracing::info!(
                ticket = %ticket.id,
                amount = ticket.amount,
                "custody forwarded to the bridge sink"
            );
            Json(ticket).into_response()
        }
        Err(e) => reject(&state, vault_error_status(&e), e.to_string()),
    }
}

/// `POST /admin/freeze` — pauses or resumes deposits and redesignations.
async fn freeze_handler(State(state): State<AppState>, Json(req): Json<FreezeRequest>) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.set_frozen(&caller, req.frozen) {
        Ok(()) => {
            let response = gate_response(&deployment);
            finish_mutation(&state, &deployment, now, gate_event(&deployment));
            tracing::info!(frozen = req.frozen, "vault freeze gate moved");
            Json(response).into_response()
        }
        Err(e) => reject(&state, vault_error_status(&e), e.to_string()),
    }
}

/// `POST /admin/redemptions` — opens or closes the redemption window.
async fn redemptions_handler(
    State(state): State<AppState>,
    Json(req): Json<RedemptionsRequest>,
) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.set_redemptions_open(&caller, req.open) {
        Ok(()) => {
            let response = gate_response(&deployment);
            finish_mutation(&state, &deployment, now, gate_event(&deployment));
            tracing::info!(open = req.open, "redemption window moved");
            Json(response).into_response()
        }
        Err(e) => reject(&state, vault_error_status(&e), e.to_string()),
    }
}

/// `POST /admin/governor` — hands the governor role to a new address.
async fn governor_handler(
    State(state): State<AppState>,
    Json(req): Json<GovernorRequest>,
) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    let caller = match parse_address(&state, "caller", &req.caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let new_governor = match parse_address(&state, "new_governor", &req.new_governor) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.transfer_governance(&caller, new_governor) {
        Ok(()) => {
            state.metrics.observe_deployment(&deployment, now);
            persist(&state, &deployment);
            tracing::info!(governor = %new_governor, "governance handed over");
            Json(GovernorResponse {
                governor: new_governor.to_bech32(),
            })
            .into_response()
        }
        Err(e) => reject(&state, vault_error_status(&e), e.to_string()),
    }
}

/// `POST /faucet` — mints devnet collateral. Refused outright on mainnet;
/// the open mint is deployment seeding plumbing, not an issuance policy.
async fn faucet_handler(State(state): State<AppState>, Json(req): Json<FaucetRequest>) -> Response {
    let _timer = state.metrics.call_latency_seconds.start_timer();
    if state.network == config::NETWORK_ID_MAINNET {
        return reject(
            &state,
            StatusCode::FORBIDDEN,
            "the faucet is not available on mainnet".to_string(),
        );
    }

    let account = match parse_address(&state, "account", &req.account) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let now = wall_now();
    let mut deployment = state.deployment.write().await;
    match deployment.fund(&account, req.amount) {
        Ok(()) => {
            state.metrics.observe_deployment(&deployment, now);
            persist(&state, &deployment);
            Json(FaucetResponse {
                account: account.to_bech32(),
                minted: req.amount,
                balance: deployment.asset().balance_of(&account),
            })
            .into_response()
        }
        Err(e) => reject(&state, StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// Snapshot of the three governance gates, shared by the admin responses.
fn gate_response(deployment: &Deployment) -> GateResponse {
    GateResponse {
        frozen: deployment.vault().is_frozen(),
        redemptions_open: deployment.vault().redemptions_open(),
        display_suppressed: deployment.token().is_display_suppressed(),
    }
}

/// The gate-change event mirroring [`gate_response`].
fn gate_event(deployment: &Deployment) -> NodeEvent {
    NodeEvent::GateChange {
        frozen: deployment.vault().is_frozen(),
        redemptions_open: deployment.vault().redemptions_open(),
        display_suppressed: deployment.token().is_display_suppressed(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use solera_vault::deployment::DeploymentConfig;
    use solera_vault::lock_vault::{DepositReceipt, RedeemReceipt};
    use solera_vault::rebasing_token::RebaseNote;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn governor() -> Address {
        Address::derive("governor")
    }

    fn setter() -> Address {
        Address::derive("rate-setter")
    }

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn bob() -> Address {
        Address::derive("bob")
    }

    fn dest_hex(byte: u8) -> String {
        hex::encode([byte; 32])
    }

    /// Creates a test AppState on the given network. The snapshot lives in
    /// a scratch directory the caller must keep alive alongside the state.
    fn test_app_state_on(network: u32) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("scratch dir");
        let cfg = DeploymentConfig::for_network(network, governor(), setter());
        let deployment = Deployment::bootstrap(cfg, wall_now());
        let store = SnapshotStore::new(dir.path().join("state.json"));
        let (event_tx, _) = broadcast::channel(16);

        let state = AppState {
            version: "0.1.0-test".into(),
            network,
            deployment: Arc::new(RwLock::new(deployment)),
            store: Arc::new(store),
            event_tx,
            metrics: Arc::new(crate::metrics::NodeMetrics::new()),
        };
        (state, dir)
    }

    fn test_app_state() -> (AppState, tempfile::TempDir) {
        test_app_state_on(config::NETWORK_ID_DEVNET)
    }

    /// Sends a GET request and returns the (status, body_bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a POST request with JSON body and returns (status, body_bytes).
    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Faucets `amount` to `account` and asserts it succeeded.
    async fn fund(router: &Router, account: &Address, amount: Assets) {
        let (status, _) = post_json(
            router,
            "/faucet",
            serde_json::json!({ "account": account.to_bech32(), "amount": amount }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Deposits `amount` for `account` toward destination `0x2a..2a`.
    async fn deposit(router: &Router, account: &Address, amount: Assets) {
        let (status, _) = post_json(
            router,
            "/deposit",
            serde_json::json!({
                "caller": account.to_bech32(),
                "amount": amount,
                "destination": dest_hex(0x2A),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // -- 1. Health endpoint ---------------------------------------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (state, _dir) = test_app_state();
        let router = create_router(state);
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    // -- 2. Status endpoint reports the deployment -----------------------------

    #[tokio::test]
    async fn status_endpoint_reports_the_deployment() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        fund(&router, &alice(), 10_000).await;
        deposit(&router, &alice(), 2_500).await;

        let (status, body) = get(&router, "/status").await;
        assert_eq!(status, StatusCode::OK);

        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.version, "0.1.0-test");
        assert_eq!(resp.fingerprint, config::PROTOCOL_FINGERPRINT);
        assert_eq!(resp.deployment.network, "devnet");
        assert_eq!(resp.deployment.total_shares, 2_500);
        assert_eq!(resp.deployment.custody_balance, 2_500);
        assert!(!resp.deployment.frozen);
        assert!(!resp.deployment.redemptions_open);
    }

    // -- 3. Rate endpoint tracks an armed schedule ------------------------------

    #[tokio::test]
    async fn rate_endpoint_tracks_an_armed_schedule() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        let base = state.deployment.read().await.token().base();

        let (status, body) = get(&router, "/rate").await;
        assert_eq!(status, StatusCode::OK);
        let flat: RateResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(flat.current_rate, base);
        assert_eq!(flat.phase, "flat");

        let end = wall_now() + 3_600;
        let (status, body) = post_json(
            &router,
            "/rebase/rate",
            serde_json::json!({
                "caller": setter().to_bech32(),
                "target_rate": 2 * base,
                "update_end": end,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let note: RebaseNote = serde_json::from_slice(&body).unwrap();
        assert_eq!(note.anchored_rate, base);
        assert_eq!(note.target_rate, 2 * base);

        let (_, body) = get(&router, "/rate").await;
        let armed: RateResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(armed.target_rate, 2 * base);
        assert_eq!(armed.update_end, end);
        assert_eq!(armed.phase, "interpolating");
        assert_eq!(state.metrics.rebases_total.get(), 1);
    }

    // -- 4. Account endpoint returns balances -----------------------------------

    #[tokio::test]
    async fn account_endpoint_returns_balances() {
        let (state, _dir) = test_app_state();
        let router = create_router(state);
        fund(&router, &alice(), 10_000).await;
        deposit(&router, &alice(), 4_000).await;

        let (status, body) =
            get(&router, &format!("/accounts/{}", alice().to_bech32())).await;
        assert_eq!(status, StatusCode::OK);

        let resp: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.address, alice().to_bech32());
        assert_eq!(resp.collateral, 6_000);
        assert_eq!(resp.shares, 4_000);
        assert_eq!(resp.display_balance, 4_000);
        assert_eq!(resp.designation, Some(dest_hex(0x2A)));
    }

    // -- 5. Unknown accounts read zero, not 404 ---------------------------------

    #[tokio::test]
    async fn unknown_accounts_read_zero() {
        let (state, _dir) = test_app_state();
        let router = create_router(state);
        let (status, body) =
            get(&router, &format!("/accounts/{}", bob().to_bech32())).await;

        assert_eq!(status, StatusCode::OK);
        let resp: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.collateral, 0);
        assert_eq!(resp.shares, 0);
        assert_eq!(resp.designation, None);
    }

    // -- 6. Garbage addresses are a counted 400 ---------------------------------

    #[tokio::test]
    async fn garbage_addresses_are_rejected() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        let (status, body) = get(&router, "/accounts/nonsense").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("invalid address"));
        assert_eq!(state.metrics.rejected_calls_total.get(), 1);
    }

    // -- 7. Deposit applies, persists, and counts --------------------------------

    #[tokio::test]
    async fn deposit_applies_and_persists() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        fund(&router, &alice(), 10_000).await;

        let (status, body) = post_json(
            &router,
            "/deposit",
            serde_json::json!({
                "caller": alice().to_bech32(),
                "amount": 2_500,
                "destination": dest_hex(0xAB),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let receipt: DepositReceipt = serde_json::from_slice(&body).unwrap();
        assert_eq!(receipt.depositor, alice());
        assert_eq!(receipt.amount, 2_500);
        assert_eq!(receipt.shares_minted, 2_500);

        assert_eq!(state.metrics.deposits_total.get(), 1);
        assert_eq!(state.metrics.total_shares.get(), 2_500);
        assert_eq!(state.metrics.vault_custody.get(), 2_500);

        // The snapshot on disk is the deployment we just mutated.
        let on_disk = state.store.load().unwrap();
        assert_eq!(&on_disk, &*state.deployment.read().await);
    }

    // -- 8. Frozen vault returns 409 ---------------------------------------------

    #[tokio::test]
    async fn frozen_vault_returns_conflict() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        fund(&router, &alice(), 10_000).await;

        let (status, _) = post_json(
            &router,
            "/admin/freeze",
            serde_json::json!({ "caller": governor().to_bech32(), "frozen": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(
            &router,
            "/deposit",
            serde_json::json!({
                "caller": alice().to_bech32(),
                "amount": 1_000,
                "destination": dest_hex(1),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("lock period has ended"));
        assert_eq!(state.metrics.rejected_calls_total.get(), 1);
        assert_eq!(state.metrics.deposits_total.get(), 0);
    }

    // -- 9. Redemptions need an open window ---------------------------------------

    #[tokio::test]
    async fn redemptions_need_an_open_window() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        fund(&router, &alice(), 10_000).await;
        deposit(&router, &alice(), 1_000).await;

        let redeem_body = serde_json::json!({
            "caller": alice().to_bech32(),
            "to": alice().to_bech32(),
            "amount": 400,
        });

        let (status, body) = post_json(&router, "/redeem", redeem_body.clone()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("redemptions are not open"));

        let (status, _) = post_json(
            &router,
            "/admin/redemptions",
            serde_json::json!({ "caller": governor().to_bech32(), "open": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(&router, "/redeem", redeem_body).await;
        assert_eq!(status, StatusCode::OK);
        let receipt: RedeemReceipt = serde_json::from_slice(&body).unwrap();
        assert_eq!(receipt.requested, 400);
        assert_eq!(receipt.paid_out, 400);
        assert_eq!(state.metrics.redemptions_total.get(), 1);

        let (_, body) = get(&router, &format!("/accounts/{}", alice().to_bech32())).await;
        let account: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(account.collateral, 9_400);
        assert_eq!(account.display_balance, 600);
    }

    // -- 10. Non-governor admin calls are forbidden --------------------------------

    #[tokio::test]
    async fn non_governor_admin_calls_are_forbidden() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());

        let (status, body) = post_json(
            &router,
            "/admin/freeze",
            serde_json::json!({ "caller": alice().to_bech32(), "frozen": true }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("unauthorized"));

        assert!(!state.deployment.read().await.vault().is_frozen());
        assert_eq!(state.metrics.rejected_calls_total.get(), 1);
    }

    // -- 11. Rebase floor violations are a 400 --------------------------------------

    #[tokio::test]
    async fn rebase_below_the_anchor_is_rejected() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        let base = state.deployment.read().await.token().base();
        let end = wall_now() + 3_600;

        let (status, _) = post_json(
            &router,
            "/rebase/rate",
            serde_json::json!({
                "caller": setter().to_bech32(),
                "target_rate": 2 * base,
                "update_end": end,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The anchor is still the base rate; below it is a decrease.
        let (status, body) = post_json(
            &router,
            "/rebase/rate",
            serde_json::json!({
                "caller": setter().to_bech32(),
                "target_rate": base - 1,
                "update_end": end + 3_600,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("rate decrease not allowed"));
        assert_eq!(state.metrics.rebases_total.get(), 1);
    }

    // -- 12. APR above the token ceiling is a 400 ------------------------------------

    #[tokio::test]
    async fn apr_above_the_ceiling_is_rejected() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        let base = state.deployment.read().await.token().base();

        // 100% a year, against the default 20% ceiling.
        let (status, body) = post_json(
            &router,
            "/rebase/apr",
            serde_json::json!({
                "caller": setter().to_bech32(),
                "apr": base,
                "update_end": wall_now() + 3_600,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("exceeds the configured ceiling"));
    }

    // -- 13. Bridge sweeps custody and issues a ticket --------------------------------

    #[tokio::test]
    async fn bridge_sweeps_custody_and_issues_a_ticket() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        fund(&router, &alice(), 10_000).await;
        deposit(&router, &alice(), 3_000).await;

        // Omitted amount sweeps everything in custody.
        let (status, body) = post_json(
            &router,
            "/bridge",
            serde_json::json!({
                "caller": governor().to_bech32(),
                "destination": dest_hex(0xEE),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let ticket: BridgeTicket = serde_json::from_slice(&body).unwrap();
        assert_eq!(ticket.amount, 3_000);
        assert_eq!(ticket.destination.to_string(), dest_hex(0xEE));

        let (status, body) = get(&router, "/bridge/tickets").await;
        assert_eq!(status, StatusCode::OK);
        let tickets: Vec<BridgeTicket> = serde_json::from_slice(&body).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, ticket.id);

        assert_eq!(state.metrics.bridge_transfers_total.get(), 1);
        assert_eq!(state.metrics.vault_custody.get(), 0);
    }

    // -- 14. Faucet mints on devnet, never on mainnet ----------------------------------

    #[tokio::test]
    async fn faucet_mints_on_devnet() {
        let (state, _dir) = test_app_state();
        let router = create_router(state);
        let (status, body) = post_json(
            &router,
            "/faucet",
            serde_json::json!({ "account": alice().to_bech32(), "amount": 7_777 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let resp: FaucetResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.minted, 7_777);
        assert_eq!(resp.balance, 7_777);
    }

    #[tokio::test]
    async fn faucet_is_refused_on_mainnet() {
        let (state, _dir) = test_app_state_on(config::NETWORK_ID_MAINNET);
        let router = create_router(state.clone());

        let (status, body) = post_json(
            &router,
            "/faucet",
            serde_json::json!({ "account": alice().to_bech32(), "amount": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("not available on mainnet"));
        assert_eq!(state.metrics.rejected_calls_total.get(), 1);
    }

    // -- 15. Governance handoff through the API ------------------------------------------

    #[tokio::test]
    async fn governance_handoff_moves_the_role() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());

        let (status, body) = post_json(
            &router,
            "/admin/governor",
            serde_json::json!({
                "caller": governor().to_bech32(),
                "new_governor": bob().to_bech32(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: GovernorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.governor, bob().to_bech32());

        // The old governor's authority is gone with the role.
        let (status, _) = post_json(
            &router,
            "/admin/freeze",
            serde_json::json!({ "caller": governor().to_bech32(), "frozen": true }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post_json(
            &router,
            "/admin/freeze",
            serde_json::json!({ "caller": bob().to_bech32(), "frozen": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // -- 16. Mutations broadcast WebSocket events -----------------------------------------

    #[tokio::test]
    async fn mutations_broadcast_events() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        let mut rx = state.event_tx.subscribe();

        fund(&router, &alice(), 10_000).await;
        deposit(&router, &alice(), 2_500).await;

        // The faucet is silent; the deposit is the first event.
        let event = rx.try_recv().unwrap();
        assert!(matches!(
            event,
            NodeEvent::Deposit {
                amount: 2_500,
                shares_minted: 2_500,
                ..
            }
        ));

        let (status, _) = post_json(
            &router,
            "/admin/freeze",
            serde_json::json!({ "caller": governor().to_bech32(), "frozen": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let event = rx.try_recv().unwrap();
        assert!(matches!(event, NodeEvent::GateChange { frozen: true, .. }));
    }

    // -- 17. Display suppression zeroes reads -----------------------------------------------

    #[tokio::test]
    async fn display_suppression_zeroes_account_reads() {
        let (state, _dir) = test_app_state();
        let router = create_router(state.clone());
        fund(&router, &alice(), 5_000).await;
        deposit(&router, &alice(), 5_000).await;

        let (status, body) = post_json(
            &router,
            "/admin/display",
            serde_json::json!({ "caller": setter().to_bech32(), "suppressed": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let gates: GateResponse = serde_json::from_slice(&body).unwrap();
        assert!(gates.display_suppressed);

        let (_, body) = get(&router, &format!("/accounts/{}", alice().to_bech32())).await;
        let account: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(account.display_balance, 0);
        // Shares are the stored truth; suppression never touches them.
        assert_eq!(account.shares, 5_000);
    }
}
