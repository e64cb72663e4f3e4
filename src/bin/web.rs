//! Reflector HTTP API
//!
//! 启动: cargo run --bin reflector-web --features web
//! 端口: [web].port，或环境变量 REFLECTOR_WEB_PORT

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reflector::config::load_config;
use reflector::core::{run_cleanup, RegistryCleanup, SessionRegistry, ShutdownCleanup, ShutdownManager};
use reflector::integrations::http::{create_router, HttpState};
use reflector::llm::create_responder_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reflector::observability::init("info");

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });
    cfg.session
        .to_session_config()
        .validate()
        .context("invalid [session] defaults")?;

    let responder = create_responder_from_config(&cfg);
    let registry = Arc::new(SessionRegistry::new(responder));
    let app = create_router(Arc::new(HttpState::from_config(Arc::clone(&registry), &cfg)));

    let port = std::env::var("REFLECTOR_WEB_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(cfg.web.port);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Reflector API: http://{}", addr);

    let shutdown = ShutdownManager::new();
    shutdown.install_signal_handlers();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.wait_for_shutdown().await })
        .await?;

    let cleanup: Vec<Arc<dyn ShutdownCleanup>> = vec![Arc::new(RegistryCleanup::new(registry))];
    run_cleanup(&cleanup, Duration::from_secs(5)).await;
    Ok(())
}
