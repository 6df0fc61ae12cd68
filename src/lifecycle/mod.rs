//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain sessions (bounded) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Startup is fail fast: config, logging, upstream client, then listener
//! - Draining has a deadline since idle sessions have no timeout of their own

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, DRAIN_TIMEOUT};
pub use signals::shutdown_signal;
