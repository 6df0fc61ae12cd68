//! Upstream dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! captured headers + normalized body
//!     → Upstream::dispatch (one fresh POST per cycle)
//!     → status, headers, full body
//! ```
//!
//! # Design Decisions
//! - The session loop only sees the [`Upstream`] trait; the TLS trust policy
//!   lives inside the implementation it is handed at startup
//! - No retries: a failed dispatch ends the session
//! - Nothing is pooled or cached across cycles beyond the HTTP client itself

use std::future::Future;

use crate::error::RelayResult;
use crate::http::request::HeaderFields;

pub mod client;

pub use client::{ClientBuildError, UpstreamClient};

/// One outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Headers captured from the inbound frame.
    pub headers: HeaderFields,
    /// Normalized JSON body.
    pub body: Vec<u8>,
}

/// The remote reply, fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Header names and raw values in the order received.
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Vec<u8>,
}

/// Capability to perform the outbound secured request.
pub trait Upstream: Send + Sync {
    /// Send `request` and read the complete response.
    ///
    /// Fails with [`crate::error::RelayError::Dispatch`] if the connection
    /// cannot be established, the request cannot be sent, or the body cannot
    /// be fully read.
    fn dispatch(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = RelayResult<UpstreamResponse>> + Send;
}
