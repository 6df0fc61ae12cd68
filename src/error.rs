//! Error kinds raised while relaying a cycle.
//!
//! Every variant of [`RelayError`] terminates the session without a response.
//! An upstream-reported JSON-RPC error is not represented here: it travels as
//! the `upstream_error` flag of [`crate::jsonrpc::NormalizedResponse`] and is
//! answered with status 500.

use thiserror::Error;

/// Violations of the inbound request frame structure.
#[derive(Debug, Error)]
pub enum FramingError {
    /// Line longer than the accepted maximum.
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    /// Header line without a `:` separator.
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    /// Header line whose name is empty after trimming.
    #[error("header line with empty name")]
    EmptyHeaderName,

    /// Header block ended without a `content-length` header.
    #[error("missing content-length header")]
    MissingContentLength,

    /// `content-length` value is not a non-negative integer.
    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    /// Declared body exceeds the configured maximum.
    #[error("declared body of {declared} bytes exceeds limit of {max} bytes")]
    BodyTooLarge { declared: usize, max: usize },

    /// Stream closed in the middle of the header block.
    #[error("stream closed before end of headers")]
    TruncatedHeaders,

    /// Stream closed before the declared body was available.
    #[error("incomplete body: expected {expected} bytes, received {received}")]
    IncompleteBody { expected: usize, received: usize },

    /// Read error on the inbound stream.
    #[error("read error: {0}")]
    Io(#[source] std::io::Error),
}

/// Errors that end a session without sending a response.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Body is not valid JSON or not a JSON object.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Method-specific structural expectation violated.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Outbound request could not be completed.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Writing the response frame failed.
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Short label for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Framing(_) => "framing",
            RelayError::Decode(_) => "decode",
            RelayError::InvalidInput(_) => "invalid_input",
            RelayError::Dispatch(_) => "dispatch",
            RelayError::Io(_) => "io",
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
