//! Response-side normalization and error detection.

use serde_json::{Map, Value};

use crate::error::RelayResult;

/// Status code reported to the client when the upstream returned an `error`.
pub const UPSTREAM_ERROR_STATUS: u16 = 500;

/// Upstream body after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedResponse {
    /// Re-encoded body, `error` member included verbatim.
    pub body: Vec<u8>,
    /// The body carried a non-null `error` member.
    pub upstream_error: bool,
}

impl NormalizedResponse {
    /// Status code for the client: 500 on upstream error, otherwise the
    /// upstream's own status.
    pub fn client_status(&self, upstream_status: u16) -> u16 {
        if self.upstream_error {
            UPSTREAM_ERROR_STATUS
        } else {
            upstream_status
        }
    }
}

/// Decode an upstream body and flag a non-null `error` member.
///
/// The error object is never rewritten; it reaches the client as sent.
pub fn normalize_response(body: &[u8]) -> RelayResult<NormalizedResponse> {
    let response: Map<String, Value> = serde_json::from_slice(body)?;

    let upstream_error = match response.get("error") {
        None | Some(Value::Null) => false,
        Some(error) => {
            tracing::warn!(error = %error, "Error from remote server");
            true
        }
    };

    Ok(NormalizedResponse {
        body: serde_json::to_vec(&response)?,
        upstream_error,
    })
}
