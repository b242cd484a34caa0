//! The config snapshot store and observer sink implementations. A real
//! deployment points this crate at Postgres/MySQL/SQLite; this repo ships
//! the `SnapshotStore` contract, a JSON-seeded `ArcSwap` implementation,
//! and the sink side of the observer fan-out (JSONL + Prometheus).

pub mod sinks;
pub mod snapshot_store;

pub use sinks::{JsonlEventSink, MetricsEventSink};
pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore, StorageError};
