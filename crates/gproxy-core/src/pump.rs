//! Streaming pump: drains the upstream byte channel and hands
//! client-ready frames to the response body, either byte-for-byte (bypass)
//! or through the transform pipeline. TTFT is the instant of the first
//! frame handed to the client; cancellation is cooperative — dropping the
//! returned stream drops the upstream receiver, which ends the upstream
//! read task on its next await.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use gproxy_provider_core::{Event, EventHub, RequestRecord};
use gproxy_transform::StreamPipeline;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub type ClientByteStream = ReceiverStream<Result<Bytes, std::io::Error>>;

/// Forwards upstream bytes to the client unchanged. Used on the bypass
/// path, where no UIF is materialized (client bytes mirror upstream bytes).
pub fn spawn_bypass(
    mut upstream_rx: mpsc::Receiver<Bytes>,
    hub: Arc<EventHub>,
    build_record: impl FnOnce(Option<Instant>) -> RequestRecord + Send + 'static,
) -> ClientByteStream {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut ttft = None;
        while let Some(chunk) = upstream_rx.recv().await {
            if ttft.is_none() {
                ttft = Some(Instant::now());
            }
            if tx.send(Ok(chunk)).await.is_err() {
                break;
            }
        }
        hub.emit(Event::Terminal(build_record(ttft))).await;
    });
    ReceiverStream::new(rx)
}

/// Feeds upstream bytes through the per-request [`StreamPipeline`] and
/// forwards the client-shaped frames it produces, finishing with the
/// client protocol's own terminal sentinel regardless of how the provider
/// signalled completion.
pub fn spawn_transform(
    mut upstream_rx: mpsc::Receiver<Bytes>,
    mut pipeline: StreamPipeline,
    hub: Arc<EventHub>,
    build_record: impl FnOnce(Option<Instant>, &StreamPipeline) -> RequestRecord + Send + 'static,
) -> ClientByteStream {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut ttft = None;
        'drain: while let Some(chunk) = upstream_rx.recv().await {
            let frames = match pipeline.push_upstream_bytes(&chunk) {
                Ok(frames) => frames,
                Err(err) => {
                    tracing::warn!(event = "stream_transform_error", error = %err);
                    break 'drain;
                }
            };
            for frame in frames {
                if ttft.is_none() {
                    ttft = Some(Instant::now());
                }
                if tx.send(Ok(frame)).await.is_err() {
                    return;
                }
            }
        }
        if let Ok(terminal) = pipeline.terminal_frame() {
            let _ = tx.send(Ok(terminal)).await;
        }
        hub.emit(Event::Terminal(build_record(ttft, &pipeline))).await;
    });
    ReceiverStream::new(rx)
}
