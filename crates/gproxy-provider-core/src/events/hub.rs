use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use super::types::Event;

pub trait EventSink: Send + Sync {
    fn write<'a>(&'a self, event: &'a Event) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Non-blocking fan-out from the streaming pump to every registered sink,
/// backed by a bounded broadcast buffer. When a subscriber falls behind,
/// the channel drops its oldest buffered events rather than applying
/// backpressure to the emitter; `dropped_total` tracks how many were lost.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<Inner>,
}

struct Inner {
    tx: broadcast::Sender<Event>,
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
    dropped: AtomicU64,
}

impl EventHub {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self {
            inner: Arc::new(Inner {
                tx,
                sinks: RwLock::new(Vec::new()),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.tx.subscribe()
    }

    pub async fn add_sink(&self, sink: Arc<dyn EventSink>) {
        self.inner.sinks.write().await.push(sink);
    }

    pub async fn emit(&self, event: Event) {
        let _ = self.inner.tx.send(event.clone());
        let sinks = self.inner.sinks.read().await.clone();
        for sink in sinks {
            let event_ref = event.clone();
            tokio::spawn(async move {
                sink.write(&event_ref).await;
            });
        }
    }

    /// Drives one subscriber to completion, feeding every received event to
    /// `handler` and accounting for any events the channel dropped while
    /// this subscriber lagged. Intended to be spawned once per consumer
    /// that needs ordered delivery (e.g. the metrics registry).
    pub async fn drain<F>(&self, mut handler: F)
    where
        F: FnMut(Event),
    {
        let mut rx = self.subscribe();
        loop {
            match rx.recv().await {
                Ok(event) => handler(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.inner.dropped.fetch_add(skipped, Ordering::Relaxed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    pub fn dropped_total(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}
