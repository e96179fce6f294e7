use std::io;

use tracing::{debug, warn};

use super::{OutboundSink, UpstreamStream, Variant};

/// how a session ended. exactly one of these per session
#[derive(Debug)]
pub enum RelayOutcome {
    /// origin hit end of stream and the client got everything
    Completed { bytes: u64 },
    /// origin read failed after the response head went out, the client sees a cut off body
    Aborted { bytes: u64, error: io::Error },
    /// client went away first
    Cancelled { bytes: u64 },
}

impl RelayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Aborted { .. } => "aborted",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// bytes handed to the sink before the session closed
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Completed { bytes } | Self::Aborted { bytes, .. } | Self::Cancelled { bytes } => {
                *bytes
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ReadingUpstream,
    Closed,
}

impl SessionState {
    fn move_to(&mut self, next: SessionState) {
        debug_assert!(*self != SessionState::Closed, "closed sessions are terminal");
        *self = next;
    }
}

/// one origin body paired with one client body
pub struct RelaySession {
    variant: Variant,
    upstream: UpstreamStream,
    sink: OutboundSink,
    state: SessionState,
    bytes: u64,
}

impl RelaySession {
    pub fn new(variant: Variant, upstream: UpstreamStream, sink: OutboundSink) -> Self {
        Self {
            variant,
            upstream,
            sink,
            state: SessionState::Idle,
            bytes: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// pumps until the origin ends, the origin errors, or the client leaves.
    ///
    /// the next upstream read only starts once the sink has room for its result, and a client
    /// hangup is noticed while idle as well as in the middle of a read. whichever way it ends,
    /// the upstream is released exactly once before this returns.
    pub async fn run(mut self) -> RelayOutcome {
        let outcome = loop {
            // Idle -> wait for the client to take the last chunk
            let permit = match self.sink.ready().await {
                Ok(permit) => permit,
                Err(_) => break RelayOutcome::Cancelled { bytes: self.bytes },
            };

            self.state.move_to(SessionState::ReadingUpstream);

            let next = tokio::select! {
                biased;
                _ = self.sink.closed() => break RelayOutcome::Cancelled { bytes: self.bytes },
                next = self.upstream.read_chunk() => next,
            };

            match next {
                Ok(Some(chunk)) => {
                    self.bytes += chunk.len() as u64;
                    // empty chunks are legal from hyper, no point forwarding them
                    if !chunk.is_empty() {
                        permit.send(Ok(chunk));
                    }
                    self.state.move_to(SessionState::Idle);
                }
                Ok(None) => break RelayOutcome::Completed { bytes: self.bytes },
                Err(error) => {
                    permit.send(Err(io::Error::new(error.kind(), "upstream read failed")));
                    break RelayOutcome::Aborted {
                        bytes: self.bytes,
                        error,
                    };
                }
            }
        };

        self.close(outcome)
    }

    fn close(mut self, outcome: RelayOutcome) -> RelayOutcome {
        self.state.move_to(SessionState::Closed);

        // no-op if something already released it
        self.upstream.release();

        match &outcome {
            RelayOutcome::Aborted { bytes, error } => warn!(
                "{} relay aborted after {} bytes: {}",
                self.variant, bytes, error
            ),
            _ => debug!(
                "{} relay {} after {} bytes",
                self.variant,
                outcome.as_str(),
                outcome.bytes()
            ),
        }

        // dropping self drops the sink, which ends the client body for the completed case
        outcome
    }
}
