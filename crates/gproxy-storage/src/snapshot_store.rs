//! Lock-free snapshot holder built on `ArcSwap<ConfigSnapshot>`:
//! `current()` is a wait-free read on the hot path, `publish()` installs a
//! new snapshot and bumps its version.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use gproxy_provider_core::{Credential, ConfigSnapshot, Provider};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read seed document: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed seed document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads the initial snapshot at boot.
    async fn load(&self) -> Result<Arc<ConfigSnapshot>, StorageError>;

    /// Installs a new snapshot, returning its assigned version.
    fn publish(&self, providers: Vec<Provider>, credentials: Vec<Credential>) -> u64;

    /// The currently active snapshot. Never blocks.
    fn current(&self) -> Arc<ConfigSnapshot>;
}

/// JSON-seeded, `ArcSwap`-backed snapshot store. There is no write-back to
/// the seed file: `publish` only updates the in-memory snapshot, matching
/// the admin RPC's "accept a full snapshot, swap it in" contract.
pub struct InMemorySnapshotStore {
    seed_path: Option<std::path::PathBuf>,
    inner: ArcSwap<ConfigSnapshot>,
    next_version: AtomicU64,
}

#[derive(Debug, serde::Deserialize)]
struct SeedDocument {
    #[serde(default)]
    providers: Vec<Provider>,
    #[serde(default)]
    credentials: Vec<Credential>,
}

impl InMemorySnapshotStore {
    pub fn empty() -> Self {
        Self {
            seed_path: None,
            inner: ArcSwap::from_pointee(ConfigSnapshot::new(0, Vec::new(), Vec::new())),
            next_version: AtomicU64::new(1),
        }
    }

    pub fn seeded_from(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            seed_path: Some(path.into()),
            ..Self::empty()
        }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> Result<Arc<ConfigSnapshot>, StorageError> {
        let Some(path) = &self.seed_path else {
            return Ok(self.inner.load_full());
        };
        let raw = tokio::fs::read(path).await?;
        let seed: SeedDocument = serde_json::from_slice(&raw)?;
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(ConfigSnapshot::new(version, seed.providers, seed.credentials));
        self.inner.store(snapshot.clone());
        tracing::info!(event = "snapshot_seeded", version, path = %path.display());
        Ok(snapshot)
    }

    fn publish(&self, providers: Vec<Provider>, credentials: Vec<Credential>) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(ConfigSnapshot::new(version, providers, credentials));
        self.inner.store(snapshot);
        tracing::info!(event = "snapshot_published", version);
        version
    }

    fn current(&self) -> Arc<ConfigSnapshot> {
        self.inner.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_handle_taken_before_publish_keeps_its_own_version() {
        let store = InMemorySnapshotStore::empty();
        let held = store.current();
        assert_eq!(held.version, 0);

        store.publish(Vec::new(), Vec::new());
        store.publish(Vec::new(), Vec::new());

        // The handle taken before either publish must still report the
        // version it was handed, regardless of how many newer snapshots
        // have since been installed.
        assert_eq!(held.version, 0);
        assert_eq!(store.current().version, 2);
    }
}
