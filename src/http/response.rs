//! Outbound response frame writer.
//!
//! The status line always carries the fixed reason token [`REASON_PHRASE`],
//! whatever the numeric code. Peers are expected to read the code only.

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Reason token written after every status code.
pub const REASON_PHRASE: &str = "OK";

/// Headers the writer owns and never copies from upstream.
const TRANSFER_ENCODING: &str = "transfer-encoding";
const CONTENT_LENGTH: &str = "content-length";

/// A response ready to be written back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    status: u16,
    headers: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
}

impl ResponseFrame {
    /// Build a frame from upstream headers (in upstream order).
    ///
    /// Names are lower-cased and only the first value of a repeated name is
    /// kept. Values are kept as raw bytes. `content-length` is rewritten to
    /// the length of `body`.
    pub fn new<I, N, V>(status: u16, upstream_headers: I, body: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let mut headers: Vec<(String, Vec<u8>)> = Vec::new();
        for (name, value) in upstream_headers {
            let name = name.as_ref().to_ascii_lowercase();
            if name == TRANSFER_ENCODING || headers.iter().any(|(n, _)| *n == name) {
                continue;
            }
            headers.push((name, value.as_ref().to_vec()));
        }

        let length = body.len().to_string().into_bytes();
        match headers.iter_mut().find(|(n, _)| n == CONTENT_LENGTH) {
            Some((_, value)) => *value = length,
            None => headers.push((CONTENT_LENGTH.to_string(), length)),
        }

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn headers(&self) -> &[(String, Vec<u8>)] {
        &self.headers
    }

    /// Serialize status line, headers, blank line and body.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {:03} {}\r\n", self.status, REASON_PHRASE).into_bytes();
        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }

    /// Write the whole frame with a single buffered write, then flush.
    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.encode()).await?;
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_status_headers_and_body() {
        let frame = ResponseFrame::new(
            200,
            [("Content-Type", "application/json"), ("Content-Length", "99")],
            b"{\"result\":\"deadbeef\"}".to_vec(),
        );
        let encoded = String::from_utf8(frame.encode()).unwrap();
        assert_eq!(
            encoded,
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 21\r\n\r\n{\"result\":\"deadbeef\"}"
        );
    }

    #[test]
    fn appends_content_length_when_absent() {
        let frame = ResponseFrame::new(500, [("date", "today")], b"{}".to_vec());
        assert_eq!(
            frame.headers(),
            &[
                ("date".to_string(), b"today".to_vec()),
                ("content-length".to_string(), b"2".to_vec())
            ]
        );
    }

    #[test]
    fn keeps_first_value_and_drops_transfer_encoding() {
        let frame = ResponseFrame::new(
            200,
            [
                ("Set-Cookie", "a=1"),
                ("Transfer-Encoding", "chunked"),
                ("set-cookie", "b=2"),
            ],
            Vec::new(),
        );
        assert_eq!(
            frame.headers(),
            &[
                ("set-cookie".to_string(), b"a=1".to_vec()),
                ("content-length".to_string(), b"0".to_vec())
            ]
        );
    }

    #[test]
    fn reason_phrase_is_fixed() {
        let frame = ResponseFrame::new(404, Vec::<(&str, &str)>::new(), Vec::new());
        assert!(frame.encode().starts_with(b"HTTP/1.1 404 OK\r\n"));

        let frame = ResponseFrame::new(7, Vec::<(&str, &str)>::new(), Vec::new());
        assert!(frame.encode().starts_with(b"HTTP/1.1 007 OK\r\n"));
    }

    #[test]
    fn non_utf8_header_value_is_kept_verbatim() {
        let value: &[u8] = b"caf\xe9";
        let frame = ResponseFrame::new(200, [("X-Note", value)], Vec::new());

        let encoded = frame.encode();
        let expected: &[u8] = b"x-note: caf\xe9\r\n";
        assert!(encoded.windows(expected.len()).any(|w| w == expected));
    }

    #[tokio::test]
    async fn writes_to_stream() {
        let frame = ResponseFrame::new(200, Vec::<(&str, &str)>::new(), b"{}".to_vec());
        let mut out = Vec::new();
        frame.write_to(&mut out).await.unwrap();
        assert_eq!(out, frame.encode());
    }
}
