//! # Prometheus Metrics
//!
//! Exposes operational metrics for the deposit-program node. Scraped by
//! Prometheus at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers. Counters track
//! mutations the API has applied; gauges mirror the live deployment and are
//! refreshed after every successful mutation.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

use solera_ledger::rate::Timestamp;
use solera_vault::base_asset::BaseAsset;
use solera_vault::deployment::Deployment;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers and background tasks.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of deposits accepted.
    pub deposits_total: IntCounter,
    /// Total number of redemptions paid out.
    pub redemptions_total: IntCounter,
    /// Total number of rebase schedules armed (by rate or by APR).
    pub rebases_total: IntCounter,
    /// Total number of bridge transfers forwarded to the sink.
    pub bridge_transfers_total: IntCounter,
    /// Total number of API calls rejected (validation, role, or state gates).
    pub rejected_calls_total: IntCounter,
    /// The live share rate, in fixed-point rate units.
    pub share_rate: IntGauge,
    /// Total shares outstanding across all holders.
    pub total_shares: IntGauge,
    /// Base asset currently held in vault custody.
    pub vault_custody: IntGauge,
    /// Number of accounts holding a nonzero share balance.
    pub token_holders: IntGauge,
    /// Histogram of API call processing latency in seconds.
    pub call_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("solera".into()), None)
            .expect("failed to create prometheus registry");

        let deposits_total = IntCounter::new(
            "deposits_total",
            "Total number of deposits accepted by the vault",
        )
        .expect("metric creation");
        registry
            .register(Box::new(deposits_total.clone()))
            .expect("metric registration");

        let redemptions_total = IntCounter::new(
            "redemptions_total",
            "Total number of redemptions paid out of custody",
        )
        .expect("metric creation");
        registry
            .register(Box::new(redemptions_total.clone()))
            .expect("metric registration");

        let rebases_total = IntCounter::new(
            "rebases_total",
            "Total number of rebase schedules armed",
        )
        .expect("metric creation");
        registry
            .register(Box::new(rebases_total.clone()))
            .expect("metric registration");

        let bridge_transfers_total = IntCounter::new(
            "bridge_transfers_total",
            "Total number of custody transfers forwarded to the bridge sink",
        )
        .expect("metric creation");
        registry
            .register(Box::new(bridge_transfers_total.clone()))
            .expect("metric registration");

        let rejected_calls_total = IntCounter::new(
            "rejected_calls_total",
            "Total number of API calls rejected by validation or state gates",
        )
        .expect("metric creation");
        registry
            .register(Box::new(rejected_calls_total.clone()))
            .expect("metric registration");

        let share_rate = IntGauge::new(
            "share_rate",
            "Live share-to-asset rate in fixed-point rate units",
        )
        .expect("metric creation");
        registry
            .register(Box::new(share_rate.clone()))
            .expect("metric registration");

        let total_shares =
            IntGauge::new("total_shares", "Total shares outstanding across all holders")
                .expect("metric creation");
        registry
            .register(Box::new(total_shares.clone()))
            .expect("metric registration");

        let vault_custody = IntGauge::new(
            "vault_custody",
            "Base asset currently held in vault custody",
        )
        .expect("metric creation");
        registry
            .register(Box::new(vault_custody.clone()))
            .expect("metric registration");

        let token_holders = IntGauge::new(
            "token_holders",
            "Number of accounts holding a nonzero share balance",
        )
        .expect("metric creation");
        registry
            .register(Box::new(token_holders.clone()))
            .expect("metric registration");

        let call_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "call_latency_seconds",
                "End-to-end API call processing latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(call_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            deposits_total,
            redemptions_total,
            rebases_total,
            bridge_transfers_total,
            rejected_calls_total,
            share_rate,
            total_shares,
            vault_custody,
            token_holders,
            call_latency_seconds,
        }
    }

    /// Refreshes all gauges from a deployment. Called after every successful
    /// mutation and once at boot so scrapes never see stale zeros.
    pub fn observe_deployment(&self, deployment: &Deployment, now: Timestamp) {
        self.share_rate.set(deployment.token().share_rate(now) as i64);
        self.total_shares.set(deployment.token().total_shares() as i64);
        self.vault_custody.set(
            deployment
                .asset()
                .balance_of(deployment.vault().custody()) as i64,
        );
        self.token_holders.set(deployment.token().holder_count() as i64);
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

/// Shared metrics state passed to axum handlers via extension.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
