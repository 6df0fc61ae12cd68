//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Local listener settings.
    pub listener: ListenerConfig,

    /// Remote JSON-RPC service.
    pub upstream: UpstreamConfig,

    /// Per-connection session behaviour.
    pub session: SessionConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Local bind address (e.g., "0.0.0.0").
    pub bind_address: String,

    /// Local bind port.
    pub bind_port: u16,

    /// Maximum concurrent sessions (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// `address:port` form suitable for binding.
    pub fn socket_address(&self) -> String {
        join_host_port(&self.bind_address, self.bind_port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            bind_port: 8080,
            max_connections: 1024,
        }
    }
}

/// Outbound certificate trust policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    /// Verify the remote certificate against the system roots.
    Verified,
    /// Accept any certificate presented by the remote endpoint.
    AcceptInvalid,
}

/// Remote JSON-RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Remote host name or IP address.
    pub address: String,

    /// Remote port.
    pub port: u16,

    /// URL scheme, "https" or "http".
    pub scheme: String,

    /// Certificate trust policy for https.
    pub trust: TrustMode,

    /// Connection establishment timeout in seconds (unset = none).
    pub connect_timeout_secs: Option<u64>,

    /// Whole-request timeout in seconds (unset = none).
    pub request_timeout_secs: Option<u64>,
}

impl UpstreamConfig {
    /// Base URL of the remote endpoint, e.g. `https://10.0.0.2:8332/`.
    pub fn endpoint(&self) -> String {
        format!("{}://{}/", self.scheme, join_host_port(&self.address, self.port))
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8332,
            scheme: "https".to_string(),
            trust: TrustMode::AcceptInvalid,
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

/// Session loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Pause before closing a terminated session, in milliseconds.
    pub cooldown_ms: u64,

    /// Idle between stray lines preceding a request line, in milliseconds.
    /// Zero yields to the scheduler instead of sleeping.
    pub resync_idle_ms: u64,

    /// Maximum accepted `content-length` in bytes.
    pub max_body_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            resync_idle_ms: 0,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log inbound and upstream payloads before transformation.
    pub log_payloads: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_payloads: true,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Join host and port, bracketing bare IPv6 literals.
fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
