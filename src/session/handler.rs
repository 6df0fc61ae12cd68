//! Per-connection session loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::error::RelayResult;
use crate::http::request::{FrameReader, RequestFrame};
use crate::http::response::ResponseFrame;
use crate::jsonrpc::{normalize_request, normalize_response};
use crate::net::connection::ConnectionId;
use crate::observability::metrics;
use crate::session::state::{CycleOutcome, SessionState, SessionSummary, Termination};
use crate::upstream::{Upstream, UpstreamRequest};

/// The only status that lets a session continue with another cycle.
pub const SUCCESS_STATUS: u16 = 200;

/// Session settings derived from configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Pause before releasing a terminated connection.
    pub cooldown: Duration,
    /// Idle between stray lines preceding a request line.
    pub resync_idle: Duration,
    /// Largest accepted request body.
    pub max_body_size: usize,
    /// Log payloads before transformation.
    pub log_payloads: bool,
}

impl SessionOptions {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            cooldown: Duration::from_millis(config.session.cooldown_ms),
            resync_idle: Duration::from_millis(config.session.resync_idle_ms),
            max_body_size: config.session.max_body_size,
            log_payloads: config.observability.log_payloads,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

/// One accepted connection and the cycles run on it.
pub struct Session<S, U> {
    id: ConnectionId,
    reader: FrameReader<BufReader<ReadHalf<S>>>,
    writer: WriteHalf<S>,
    upstream: Arc<U>,
    options: SessionOptions,
    state: SessionState,
    cycles: u64,
}

impl<S, U> Session<S, U>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    U: Upstream + 'static,
{
    pub fn new(id: ConnectionId, stream: S, upstream: Arc<U>, options: SessionOptions) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        let reader = FrameReader::new(
            BufReader::new(read_half),
            options.max_body_size,
            options.resync_idle,
        );

        Self {
            id,
            reader,
            writer,
            upstream,
            options,
            state: SessionState::AwaitingFrame,
            cycles: 0,
        }
    }

    /// Run cycles until the peer closes, a cycle fails, or a response other
    /// than 200 is written. The connection is closed after the cooldown.
    pub async fn run(mut self) -> SessionSummary {
        metrics::record_session_opened();

        let termination = loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::Completed { status }) if status == SUCCESS_STATUS => continue,
                Ok(CycleOutcome::Completed { status }) => break Termination::NonSuccessStatus(status),
                Ok(CycleOutcome::PeerClosed) => break Termination::PeerClosed,
                Err(e) => break Termination::Failed(e),
            }
        };
        self.transition(SessionState::Terminated);

        match &termination {
            Termination::PeerClosed => {
                tracing::info!(connection_id = %self.id, "Connection closed by client");
            }
            Termination::NonSuccessStatus(status) => {
                tracing::info!(connection_id = %self.id, status, "Ending session after non-success response");
            }
            Termination::Failed(e) => {
                tracing::warn!(connection_id = %self.id, kind = e.kind(), error = %e, "Session failed");
            }
        }

        if !self.options.cooldown.is_zero() {
            tokio::time::sleep(self.options.cooldown).await;
        }
        let _ = self.writer.shutdown().await;

        metrics::record_session_closed(termination.reason());
        tracing::info!(connection_id = %self.id, cycles = self.cycles, "Connection closed");

        SessionSummary {
            connection_id: self.id,
            cycles: self.cycles,
            termination,
        }
    }

    /// Read one frame and relay it. Header mapping and request-line marker
    /// start fresh on every call.
    async fn run_cycle(&mut self) -> RelayResult<CycleOutcome> {
        self.transition(SessionState::AwaitingFrame);

        let frame = match self.reader.read_frame().await? {
            Some(frame) => frame,
            None => return Ok(CycleOutcome::PeerClosed),
        };

        let cycle_id = Uuid::new_v4();
        let span = tracing::debug_span!("cycle", connection_id = %self.id, cycle_id = %cycle_id);
        self.relay(frame).instrument(span).await
    }

    async fn relay(&mut self, frame: RequestFrame) -> RelayResult<CycleOutcome> {
        if self.options.log_payloads {
            tracing::debug!(payload = %String::from_utf8_lossy(&frame.body), "Inbound request");
        }
        let body = normalize_request(&frame.body)?;

        self.transition(SessionState::Dispatching);
        let started = Instant::now();
        let response = self
            .upstream
            .dispatch(UpstreamRequest {
                headers: frame.headers,
                body,
            })
            .await?;
        metrics::record_upstream_duration(started);

        if self.options.log_payloads {
            tracing::debug!(
                status = response.status,
                payload = %String::from_utf8_lossy(&response.body),
                "Upstream response"
            );
        }
        let normalized = normalize_response(&response.body)?;
        let status = normalized.client_status(response.status);

        self.transition(SessionState::WritingResponse);
        ResponseFrame::new(status, response.headers, normalized.body)
            .write_to(&mut self.writer)
            .await?;

        self.cycles += 1;
        metrics::record_cycle(status);
        tracing::debug!(status, upstream_status = response.status, "Cycle completed");

        Ok(CycleOutcome::Completed { status })
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::trace!(connection_id = %self.id, from = %self.state, to = %next, "Session state");
            self.state = next;
        }
    }
}
