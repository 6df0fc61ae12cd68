//! Outbound transport security.
//!
//! The trust policy is turned into an immutable `reqwest::Client` once at
//! startup and handed to the upstream dispatcher. Nothing process-wide is
//! mutated.

use std::time::Duration;

use crate::config::{TrustMode, UpstreamConfig};

/// Build the outbound HTTP client for the configured trust policy and timeouts.
///
/// With [`TrustMode::AcceptInvalid`] the client accepts any certificate the
/// remote presents, including self-signed and expired ones. This is meant
/// for relays that sit next to a node run by the same operator.
pub fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().no_proxy();

    if config.trust == TrustMode::AcceptInvalid {
        builder = builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }
    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}
