//! Session loop subsystem.
//!
//! # State Machine
//! ```text
//! accept ─▶ AwaitingFrame ─▶ Dispatching ─▶ WritingResponse ─┐
//!               ▲                                            │ status == 200
//!               └────────────────────────────────────────────┘
//!
//! any state ─(error, peer close, status != 200)─▶ Terminated ─(cooldown)─▶ close
//! ```
//!
//! # Design Decisions
//! - One Tokio task per connection; sessions share only immutable config and
//!   the upstream capability
//! - Steps within a cycle are strictly sequential
//! - Failed cycles write nothing; the client observes the connection closing
//! - An upstream JSON-RPC error is answered with 500 and then ends the session

pub mod handler;
pub mod state;

pub use handler::{Session, SessionOptions, SUCCESS_STATUS};
pub use state::{CycleOutcome, SessionState, SessionSummary, Termination};
