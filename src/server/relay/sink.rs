use std::io;

use axum::body::{Body, Bytes};
use tokio::sync::mpsc;

pub type SinkItem = Result<Bytes, io::Error>;

// one slot, the session can't get more than a single chunk ahead of the client
const SINK_CAPACITY: usize = 1;

/// the sending half of a response body. the receiving half is owned by hyper once the
/// response goes out, when the client hangs up hyper drops it and [`OutboundSink::closed`]
/// resolves
pub struct OutboundSink {
    tx: mpsc::Sender<SinkItem>,
}

impl OutboundSink {
    pub fn channel() -> (Self, mpsc::Receiver<SinkItem>) {
        let (tx, rx) = mpsc::channel(SINK_CAPACITY);
        (Self { tx }, rx)
    }

    /// sink plus the body it feeds
    pub fn with_body() -> (Self, Body) {
        let (sink, rx) = Self::channel();
        (sink, body_from_receiver(rx))
    }

    /// waits until the client has taken the previous chunk
    pub async fn ready(&self) -> Result<mpsc::Permit<'_, SinkItem>, SinkClosed> {
        self.tx.reserve().await.map_err(|_| SinkClosed)
    }

    /// resolves once nobody is reading anymore
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// an `Err` item makes hyper cut the response off instead of ending it cleanly
pub fn body_from_receiver(rx: mpsc::Receiver<SinkItem>) -> Body {
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });
    Body::from_stream(stream)
}
