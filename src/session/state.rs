//! Session states and termination reasons.

use crate::error::RelayError;
use crate::net::connection::ConnectionId;

/// Where a session is within its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for (or reading) the next request frame.
    AwaitingFrame,
    /// Request normalized and in flight to the upstream.
    Dispatching,
    /// Writing the response frame back to the client.
    WritingResponse,
    /// Session is over; the connection is being released.
    Terminated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::AwaitingFrame => "awaiting_frame",
            SessionState::Dispatching => "dispatching",
            SessionState::WritingResponse => "writing_response",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Result of one cycle that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Peer closed the stream before sending a new request line.
    PeerClosed,
    /// A response with this status was written.
    Completed { status: u16 },
}

/// Why a session ended.
#[derive(Debug)]
pub enum Termination {
    /// Peer closed the stream between cycles.
    PeerClosed,
    /// A response was written with a status other than 200.
    NonSuccessStatus(u16),
    /// A cycle failed; no response was written for it.
    Failed(RelayError),
}

impl Termination {
    /// Short label for log fields and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            Termination::PeerClosed => "peer_closed",
            Termination::NonSuccessStatus(_) => "non_success_status",
            Termination::Failed(e) => e.kind(),
        }
    }
}

/// What a finished session reports back to its spawner.
#[derive(Debug)]
pub struct SessionSummary {
    pub connection_id: ConnectionId,
    /// Cycles that wrote a response.
    pub cycles: u64,
    pub termination: Termination,
}
