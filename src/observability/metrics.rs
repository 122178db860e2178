//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mint_attempts_total{outcome}` (counter): finished attempts by outcome
//! - `mint_success_total` (counter): confirmed mints
//! - `mint_gas_spent_wei` (histogram): fee paid per mined transaction
//! - `mint_readiness_checks_total{ready}` (counter): pre-mint readiness polls
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_attempt(outcome: &'static str) {
    counter!("mint_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_success() {
    counter!("mint_success_total").increment(1);
}

pub fn record_gas_spent(fee_wei: f64) {
    histogram!("mint_gas_spent_wei").record(fee_wei);
}

pub fn record_readiness_check(ready: bool) {
    let ready = if ready { "true" } else { "false" };
    counter!("mint_readiness_checks_total", "ready" => ready).increment(1);
}
