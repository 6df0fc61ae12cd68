//! HTTP-like framing and the accept loop.
//!
//! # Data Flow
//! ```text
//! TCP stream
//!     → request.rs (POST line, headers, content-length body)
//!     → session loop
//!     → response.rs (status line, lower-cased headers, recomputed content-length)
//!     → TCP stream
//!
//! server.rs: accept → spawn one session task per connection
//! ```
//!
//! # Design Decisions
//! - Not a general HTTP server: no chunked bodies, one frame at a time
//! - Framing errors end the session without a response

pub mod request;
pub mod response;
pub mod server;

pub use request::{FrameReader, HeaderFields, RequestFrame};
pub use response::ResponseFrame;
pub use server::RelayServer;
