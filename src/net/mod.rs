//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (connection ID, active-session tracking)
//!     → Hand off to the session loop
//!
//! Outbound:
//!     tls.rs (trust policy → immutable HTTP client, built once)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Inbound traffic is plaintext; only the upstream leg is encrypted

pub mod connection;
pub mod listener;
pub mod tls;
