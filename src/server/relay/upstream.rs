use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::body::Bytes;
use tracing::debug;

/// something that hands out the origin body in order, one chunk per call
#[async_trait]
pub trait ByteSource: Send {
    /// `Ok(None)` is end of stream
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>>;

    /// tear down whatever connection backs this source. only ever called once, through
    /// [`UpstreamStream::release`]
    fn release(&mut self);
}

/// flips exactly once, whoever gets `true` back from [`ReleaseOnce::claim`] owns the release
#[derive(Debug, Default)]
pub struct ReleaseOnce(AtomicBool);

impl ReleaseOnce {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_released(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// the origin body plus its release guard. released at most once, on drop at the latest
pub struct UpstreamStream {
    source: Box<dyn ByteSource>,
    released: ReleaseOnce,
}

impl UpstreamStream {
    pub fn new(source: impl ByteSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            released: ReleaseOnce::new(),
        }
    }

    /// reads after a release never reach the source, they just look like end of stream
    pub async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.released.is_released() {
            return Ok(None);
        }
        self.source.read_chunk().await
    }

    /// returns whether this call was the one that actually released
    pub fn release(&mut self) -> bool {
        if !self.released.claim() {
            return false;
        }
        self.source.release();
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.is_released()
    }
}

impl Drop for UpstreamStream {
    fn drop(&mut self) {
        if self.release() {
            debug!("upstream released on drop");
        }
    }
}

/// origin body straight off a reqwest response. dropping the response is what closes the
/// connection, so release just takes it
pub struct ReqwestByteSource {
    response: Option<reqwest::Response>,
}

impl ReqwestByteSource {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            response: Some(response),
        }
    }
}

#[async_trait]
impl ByteSource for ReqwestByteSource {
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        match self.response.as_mut() {
            Some(response) => response.chunk().await.map_err(io::Error::other),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.response.take();
    }
}
