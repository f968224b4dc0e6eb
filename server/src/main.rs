use anyhow::Context;
use crm_kanban_server::{build_router, AppState, ServerConfig, Store};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let state = AppState::new(Store::demo(), &config);
    let router = build_router(state, &config.dist);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    tracing::info!(
        addr = %config.addr,
        dist = %config.dist.display(),
        fail_updates = config.fail_updates,
        "kanban dev server listening"
    );
    axum::serve(listener, router).await.context("server stopped")?;
    Ok(())
}
