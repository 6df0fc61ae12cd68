//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_sessions_total` (counter): accepted sessions
//! - `relay_active_sessions` (gauge): sessions currently open
//! - `relay_cycles_total` (counter): completed cycles by client status
//! - `relay_session_terminations_total` (counter): session ends by reason
//! - `relay_upstream_duration_seconds` (histogram): dispatch latency
//!
//! Recording is a no-op until a recorder is installed, so sessions record
//! unconditionally and the exporter is optional.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_session_opened() {
    metrics::counter!("relay_sessions_total").increment(1);
    metrics::gauge!("relay_active_sessions").increment(1.0);
}

pub fn record_session_closed(reason: &'static str) {
    metrics::gauge!("relay_active_sessions").decrement(1.0);
    metrics::counter!("relay_session_terminations_total", "reason" => reason).increment(1);
}

pub fn record_cycle(status: u16) {
    metrics::counter!("relay_cycles_total", "status" => status.to_string()).increment(1);
}

pub fn record_upstream_duration(start: Instant) {
    metrics::histogram!("relay_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}
