//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Sessions produce:
//!     → logging.rs (structured log events, session/cycle spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every log line inside a session carries its connection ID
//! - Payloads are logged before transformation for postmortem diagnosis
//! - Metrics are cheap (atomic increments) and recorded even without an exporter

pub mod logging;
pub mod metrics;
