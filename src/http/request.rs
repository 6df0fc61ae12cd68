//! Inbound request frame reader.
//!
//! Turns a byte stream without guaranteed message boundaries into discrete
//! [`RequestFrame`]s: a `POST` request line, a block of `name: value` header
//! lines closed by an empty line, and exactly `content-length` body bytes.
//!
//! Lines received before the request line are skipped. This lets a
//! connection resynchronize after stray bytes instead of failing outright.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::FramingError;

/// Header mapping with lower-cased names.
pub type HeaderFields = BTreeMap<String, String>;

/// Longest accepted header line, terminator included. Longer lines before
/// the request line are skipped; only this prefix of them is kept.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

const REQUEST_VERB: &[u8] = b"POST";

/// One complete inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    /// Request line, trimmed.
    pub request_line: String,
    /// Captured headers.
    pub headers: HeaderFields,
    /// Exactly `content-length` bytes.
    pub body: Vec<u8>,
}

impl RequestFrame {
    /// Method token of the request line.
    pub fn method(&self) -> &str {
        self.request_line.split_whitespace().next().unwrap_or_default()
    }
}

/// Reads request frames from a buffered stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    max_body_size: usize,
    resync_idle: Duration,
    request_line_seen: bool,
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Create a reader that rejects bodies over `max_body_size` bytes and
    /// idles for `resync_idle` after each stray line.
    pub fn new(inner: R, max_body_size: usize, resync_idle: Duration) -> Self {
        Self {
            inner,
            max_body_size,
            resync_idle,
            request_line_seen: false,
        }
    }

    /// Whether the current cycle has observed its request line.
    pub fn request_line_seen(&self) -> bool {
        self.request_line_seen
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the peer closes the stream before a request
    /// line was seen.
    pub async fn read_frame(&mut self) -> Result<Option<RequestFrame>, FramingError> {
        self.request_line_seen = false;
        let mut line = Vec::new();

        let mut stray_lines = 0u64;
        let request_line = loop {
            if !self.read_scan_line(&mut line).await? {
                if stray_lines > 0 {
                    tracing::debug!(stray_lines, "Stream closed while awaiting request line");
                }
                return Ok(None);
            }
            if is_request_line(&line) {
                break String::from_utf8_lossy(&line).trim().to_string();
            }
            stray_lines += 1;
            tracing::trace!(
                stray_lines,
                len = line.len(),
                "Skipping line before request line"
            );
            self.idle().await;
        };
        self.request_line_seen = true;

        let mut headers = HeaderFields::new();
        loop {
            if !self.read_line(&mut line).await? {
                return Err(FramingError::TruncatedHeaders);
            }
            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if text.is_empty() {
                break;
            }
            let (name, value) = parse_header_line(text)?;
            headers.insert(name, value);
        }

        let declared = content_length(&headers)?;
        if declared > self.max_body_size {
            return Err(FramingError::BodyTooLarge {
                declared,
                max: self.max_body_size,
            });
        }

        let mut body = Vec::with_capacity(declared);
        (&mut self.inner)
            .take(declared as u64)
            .read_to_end(&mut body)
            .await
            .map_err(FramingError::Io)?;
        if body.len() != declared {
            return Err(FramingError::IncompleteBody {
                expected: declared,
                received: body.len(),
            });
        }

        Ok(Some(RequestFrame {
            request_line,
            headers,
            body,
        }))
    }

    /// Read one `\n`-terminated line into `buf`, replacing its contents.
    /// Returns false when the stream ended before a terminator.
    async fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<bool, FramingError> {
        buf.clear();
        (&mut self.inner)
            .take(MAX_LINE_BYTES as u64)
            .read_until(b'\n', buf)
            .await
            .map_err(FramingError::Io)?;

        if buf.last() == Some(&b'\n') {
            return Ok(true);
        }
        if buf.len() >= MAX_LINE_BYTES {
            return Err(FramingError::LineTooLong(MAX_LINE_BYTES));
        }
        Ok(false)
    }

    /// Like [`Self::read_line`], but a line over [`MAX_LINE_BYTES`] is cut to
    /// that prefix and the remainder discarded up to its terminator.
    async fn read_scan_line(&mut self, buf: &mut Vec<u8>) -> Result<bool, FramingError> {
        match self.read_line(buf).await {
            Err(FramingError::LineTooLong(_)) => {
                tracing::trace!(kept = buf.len(), "Discarding rest of over-long stray line");
                self.discard_line().await
            }
            other => other,
        }
    }

    /// Consume input through the next `\n`. Returns false on end of stream.
    async fn discard_line(&mut self) -> Result<bool, FramingError> {
        loop {
            let chunk = self.inner.fill_buf().await.map_err(FramingError::Io)?;
            if chunk.is_empty() {
                return Ok(false);
            }
            let (consumed, found) = match chunk.iter().position(|&b| b == b'\n') {
                Some(end) => (end + 1, true),
                None => (chunk.len(), false),
            };
            self.inner.consume(consumed);
            if found {
                return Ok(true);
            }
        }
    }

    async fn idle(&self) {
        if self.resync_idle.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.resync_idle).await;
        }
    }
}

fn is_request_line(line: &[u8]) -> bool {
    line.len() > REQUEST_VERB.len() && line.starts_with(REQUEST_VERB)
}

/// Split a trimmed header line at its first `:`.
fn parse_header_line(line: &str) -> Result<(String, String), FramingError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| FramingError::MalformedHeader(line.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(FramingError::EmptyHeaderName);
    }
    Ok((name.to_ascii_lowercase(), value.trim().to_string()))
}

fn content_length(headers: &HeaderFields) -> Result<usize, FramingError> {
    let value = headers
        .get("content-length")
        .ok_or(FramingError::MissingContentLength)?;
    value
        .trim()
        .parse()
        .map_err(|_| FramingError::InvalidContentLength(value.clone()))
}
