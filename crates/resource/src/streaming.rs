//! Bounded-memory streaming reads/writes with backpressure detection.

use std::time::Duration;

use bytes::Bytes;
use ldp_core::{PodError, PodResult};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Chunk size used when streaming a materialized payload out to a reader.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Minimum channel capacity for producer/consumer streaming pipelines.
pub const MIN_CHANNEL_CAPACITY: usize = 5;

/// How long a producer waits for channel capacity before treating a stalled
/// consumer as backpressure.
pub const SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// A finite, non-restartable byte stream over a resource's payload.
pub struct ByteStream {
    receiver: mpsc::Receiver<PodResult<Bytes>>,
}

impl ByteStream {
    /// Produce a stream over `data`, chunked at [`STREAM_CHUNK_SIZE`], that
    /// stops early if `cancellation` is triggered between chunks.
    pub fn from_bytes(data: Vec<u8>, cancellation: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(MIN_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            for chunk in data.chunks(STREAM_CHUNK_SIZE) {
                if cancellation.is_cancelled() {
                    break;
                }
                if tx.send(Ok(Bytes::copy_from_slice(chunk))).await.is_err() {
                    break;
                }
            }
        });

        Self { receiver: rx }
    }

    /// Receive the next chunk, or `None` once the stream is exhausted.
    pub async fn next_chunk(&mut self) -> Option<PodResult<Bytes>> {
        self.receiver.recv().await
    }

    /// Drain the stream into a single buffer (used by callers that need the
    /// full payload, e.g. format conversion).
    pub async fn collect(mut self) -> PodResult<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

/// A bounded producer/consumer pipeline that surfaces a stalled consumer as
/// [`ldp_core::ErrorKind::Backpressure`] rather than blocking indefinitely.
pub struct BackpressureGuardedSender {
    inner: mpsc::Sender<Bytes>,
}

impl BackpressureGuardedSender {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let capacity = capacity.max(MIN_CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::channel(capacity);
        (Self { inner: tx }, rx)
    }

    /// Send a chunk, failing with `Backpressure` if the consumer does not
    /// free capacity within [`SEND_TIMEOUT`].
    pub async fn send(&self, chunk: Bytes) -> PodResult<()> {
        match timeout(SEND_TIMEOUT, self.inner.send(chunk)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(PodError::storage_failed(
                "BackpressureGuardedSender::send",
                "consumer channel closed",
            )),
            Err(_) => Err(PodError::backpressure(
                "BackpressureGuardedSender::send",
                format!("consumer did not accept a chunk within {SEND_TIMEOUT:?}"),
            )),
        }
    }
}
