//! Concrete `EventSink` implementors: a JSONL file sink for request logs
//! (the Langfuse exporter is named as a peer implementor but not built
//! here) and a Prometheus registry fed from the same event stream.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex as StdMutex;

use gproxy_provider_core::{Event, EventSink};
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one JSON line per terminal event. Write failures are logged, not
/// propagated: log delivery must never affect the request path.
pub struct JsonlEventSink {
    path: std::path::PathBuf,
    file: Mutex<Option<tokio::fs::File>>,
}

impl JsonlEventSink {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    async fn file(&self) -> std::io::Result<tokio::fs::File> {
        let mut guard = self.file.lock().await;
        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            *guard = Some(file);
        }
        guard.as_ref().unwrap().try_clone().await
    }
}

impl EventSink for JsonlEventSink {
    fn write<'a>(&'a self, event: &'a Event) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let line = match serde_json::to_vec(event) {
                Ok(mut bytes) => {
                    bytes.push(b'\n');
                    bytes
                }
                Err(err) => {
                    tracing::warn!(event = "jsonl_sink_encode_failed", error = %err);
                    return;
                }
            };
            match self.file().await {
                Ok(mut file) => {
                    if let Err(err) = file.write_all(&line).await {
                        tracing::warn!(event = "jsonl_sink_write_failed", error = %err);
                    }
                }
                Err(err) => tracing::warn!(event = "jsonl_sink_open_failed", error = %err),
            }
        })
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
struct RequestLabels {
    provider: String,
    client_protocol: String,
    provider_protocol: String,
    status_code: String,
}

/// Request counters and a duration histogram, registered under one
/// registry that the admin surface exposes at `/metrics`.
pub struct MetricsEventSink {
    requests_total: Family<RequestLabels, Counter>,
    duration_ms: Histogram,
    registry: StdMutex<Registry>,
}

impl MetricsEventSink {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let requests_total = Family::<RequestLabels, Counter>::default();
        registry.register("gproxy_requests_total", "Terminal requests by outcome", requests_total.clone());
        let duration_ms = Histogram::new(
            [10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0].into_iter(),
        );
        registry.register("gproxy_request_duration_ms", "Request duration", duration_ms.clone());
        Self {
            requests_total,
            duration_ms,
            registry: StdMutex::new(registry),
        }
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buf = String::new();
        let registry = self.registry.lock().unwrap();
        let _ = encode(&mut buf, &registry);
        buf
    }
}

impl Default for MetricsEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MetricsEventSink {
    fn write<'a>(&'a self, event: &'a Event) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let Event::Terminal(record) = event;
            self.requests_total
                .get_or_create(&RequestLabels {
                    provider: record
                        .provider_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "none".to_string()),
                    client_protocol: record.client_protocol.as_str().to_string(),
                    provider_protocol: record.provider_protocol.as_str().to_string(),
                    status_code: record.status_code.to_string(),
                })
                .inc();
            self.duration_ms.observe(record.duration_ms as f64);
        })
    }
}
