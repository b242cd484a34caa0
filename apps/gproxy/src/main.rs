use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let boot = gproxy_core::bootstrap::bootstrap_from_env().await?;
    let admin_key = boot.settings.admin_key.clone();
    let store = boot.state.engine.store.clone();

    let app = axum::Router::new()
        .merge(gproxy_router::proxy_router(boot.state.clone()))
        .nest("/admin", gproxy_admin::admin_router(store, admin_key));

    let bind = format!("{}:{}", boot.settings.host, boot.settings.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(event = "listening", addr = %bind);
    axum::serve(listener, app).await?;
    Ok(())
}
