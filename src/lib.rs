//! Transparent JSON-RPC relay library.
//!
//! Accepts plaintext HTTP-like request frames, normalizes a narrow class of
//! JSON-RPC quirks, forwards the payload to a remote JSON-RPC service over
//! an encrypted transport, and frames the reply back to the client.

pub mod config;
pub mod error;
pub mod http;
pub mod jsonrpc;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;
pub mod upstream;

pub use config::schema::RelayConfig;
pub use error::{FramingError, RelayError};
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use upstream::{Upstream, UpstreamClient};
