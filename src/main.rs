//! JSON-RPC relay.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client (plaintext)
//!       │
//!       ▼
//!   net::listener ──▶ session loop (one task per connection)
//!                        │
//!                        ├─▶ http::request      FrameReader: POST line, headers, body
//!                        ├─▶ jsonrpc::request   getrawtransaction bools → 0/1
//!                        ├─▶ upstream::client   POST over TLS ──────────▶ Remote JSON-RPC
//!                        ├─▶ jsonrpc::response  non-null `error` → 500
//!                        └─▶ http::response     status line, headers, body
//!                        │
//!       ◀────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use jsonrpc_relay::config::{resolve_config, TrustMode};
use jsonrpc_relay::lifecycle::{shutdown_signal, Shutdown, DRAIN_TIMEOUT};
use jsonrpc_relay::net::listener::Listener;
use jsonrpc_relay::observability::{logging, metrics};
use jsonrpc_relay::{RelayServer, UpstreamClient};

#[derive(Parser)]
#[command(name = "jsonrpc-relay")]
#[command(about = "Relay plaintext JSON-RPC frames to a remote node over TLS", long_about = None)]
struct Cli {
    /// Optional TOML configuration file. LISTEN_ADDR, LISTEN_PORT,
    /// REMOTE_ADDR and REMOTE_PORT override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;

    logging::init(&config.observability.log_level);
    tracing::info!("jsonrpc-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        listen = %config.listener.socket_address(),
        upstream = %config.upstream.endpoint(),
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );

    if config.upstream.scheme == "https" && config.upstream.trust == TrustMode::AcceptInvalid {
        tracing::warn!(
            upstream = %config.upstream.endpoint(),
            "Upstream certificate verification is disabled; set upstream.trust = \"verified\" unless the node is run by the same operator"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let upstream = UpstreamClient::from_config(&config.upstream)?;

    // Failure to bind is fatal
    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.trigger();
        }
    });

    let server = RelayServer::new(&config, upstream);
    server.run(listener, server_shutdown).await;

    if !server.tracker().wait_for_idle(DRAIN_TIMEOUT).await {
        tracing::warn!(
            active_sessions = server.tracker().active_count(),
            "Drain timeout elapsed, exiting with sessions still open"
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
