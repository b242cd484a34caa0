//! Process wiring: reads `Settings` from the environment, loads the initial
//! snapshot, registers the observer sinks, and assembles the shared
//! `AppState` the binary's routers are built from.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use gproxy_common::Settings;
use gproxy_provider_core::{EventHub, TerminalEventSink};
use gproxy_provider_impl::{UpstreamClientConfig, WreqUpstreamClient};
use gproxy_storage::{InMemorySnapshotStore, JsonlEventSink, MetricsEventSink, SnapshotStore};

use crate::engine::Engine;
use crate::ratelimit::RateLimiter;
use crate::state::AppState;

pub struct Bootstrap {
    pub state: AppState,
    pub settings: Arc<Settings>,
}

pub async fn bootstrap_from_env() -> anyhow::Result<Bootstrap> {
    let settings = Settings::parse();
    settings.validate()?;
    bootstrap(settings).await
}

pub async fn bootstrap(settings: Settings) -> anyhow::Result<Bootstrap> {
    let settings = Arc::new(settings);

    let store: Arc<dyn SnapshotStore> = if settings.db_url.is_empty() {
        Arc::new(InMemorySnapshotStore::empty())
    } else {
        Arc::new(InMemorySnapshotStore::seeded_from(settings.db_url.clone()))
    };
    store.load().await.context("load initial config snapshot")?;

    let hub = Arc::new(EventHub::new(1024));
    hub.add_sink(Arc::new(TerminalEventSink::new())).await;

    let metrics = Arc::new(MetricsEventSink::new());
    hub.add_sink(metrics.clone()).await;

    if let Some(log_path) = &settings.log_path {
        hub.add_sink(Arc::new(JsonlEventSink::new(log_path.clone()))).await;
    }

    let upstream_config = UpstreamClientConfig::from_settings(&settings);
    let upstream = Arc::new(WreqUpstreamClient::new(upstream_config).context("build upstream client")?);

    let engine = Arc::new(Engine {
        store,
        upstream,
        limiter: Arc::new(RateLimiter::new()),
        hub,
        settings: settings.clone(),
    });

    Ok(Bootstrap {
        state: AppState { engine, metrics },
        settings,
    })
}
