//! Metrics collection and exposition.
//!
//! # Metrics
//! - `agent_config_cycles_total` (counter): configuration cycles by strategy, outcome
//! - `agent_config_applied_total` (counter): configurations applied by the router
//! - `agent_routes` (gauge): routes currently known to the router
//! - `agent_events_total` (counter): reported agent events by kind

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the outcome of a discovery/load/emit cycle.
pub fn record_cycle(strategy: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("agent_config_cycles_total", "strategy" => strategy, "outcome" => outcome)
        .increment(1);
}

/// Record a configuration applied by the router.
pub fn record_applied(routes: usize) {
    metrics::counter!("agent_config_applied_total").increment(1);
    metrics::gauge!("agent_routes").set(routes as f64);
}

/// Record a reported agent event.
pub fn record_event(kind: &'static str) {
    metrics::counter!("agent_events_total", "kind" => kind).increment(1);
}
