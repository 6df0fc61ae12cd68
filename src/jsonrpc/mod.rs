//! JSON-RPC payload normalization.
//!
//! # Data Flow
//! ```text
//! inbound body
//!     → request.rs (boolean params of getrawtransaction → 0/1)
//!     → upstream
//! upstream body
//!     → response.rs (detect non-null `error`)
//!     → status derivation (500 on upstream error)
//! ```
//!
//! Bodies are decoded into JSON object maps, so arrays (batches) and scalars
//! are rejected as decode errors. Re-encoding emits object keys sorted.

pub mod request;
pub mod response;

pub use request::{normalize_request, COERCED_BOOL_METHOD};
pub use response::{normalize_response, NormalizedResponse};
