//! Swarm orchestrator server binary.
//!
//! Wires the env-driven config, probes the persistence gateway's
//! capabilities, and serves the HTTP + WebSocket surface from
//! [`session_boundary::create_router`].
//!
//! This binary ships no real [`contracts::AgentRunner`] or
//! [`contracts::PersistenceGateway`]: both are deliberately out-of-scope
//! external collaborators (the language-model client and the persistence
//! backend). A real deployment plugs concrete implementations of those two
//! traits in here; absent one, the server still starts and runs fully
//! in-memory against [`NullGateway`] and an empty [`ScriptedAgentRunner`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use contracts::{AgentRunner, NullGateway, PersistenceGateway, ScriptedAgentRunner};
use event_bus::EventBus;
use lifecycle::LifecycleService;
use reasoning_graph::ReasoningGraph;
use session_boundary::rate_limit::SlidingWindowLimiter;
use session_boundary::state::AppState;
use swarm::{CoordinatorSettings, SwarmCoordinator};
use swarm_config::{CapabilityProbe, SwarmConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    tracing::info!("loading configuration from environment");
    let config = SwarmConfig::from_env()?;
    for warning in config.validate_at_startup() {
        tracing::warn!("{warning}");
    }

    let gateway: Arc<dyn PersistenceGateway> = Arc::new(NullGateway);
    let runner: Arc<dyn AgentRunner> = Arc::new(ScriptedAgentRunner::new(Vec::new()));

    tracing::info!("probing persistence gateway capabilities");
    let capabilities = Arc::new(CapabilityProbe::new(gateway.clone()).probe().await);
    if let Some(reason) = &capabilities.degraded_reason {
        tracing::warn!(reason, "starting in degraded mode");
    }

    let graph = Arc::new(ReasoningGraph::new());
    let bus = Arc::new(EventBus::new());
    let lifecycle = Arc::new(LifecycleService::new(gateway.clone()));
    let coordinator_settings = CoordinatorSettings::from_seconds(config.agent_timeout_seconds, config.agent_stagger_seconds);
    let coordinator = Arc::new(SwarmCoordinator::new(graph.clone(), bus.clone(), runner, gateway.clone(), coordinator_settings));
    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.rate_limit_requests as usize,
        Duration::from_secs(config.rate_limit_window_seconds),
    ));

    let config = Arc::new(config);
    let _reaper = session_boundary::reaper::spawn(bus.clone(), graph.clone());
    let state = AppState { graph, bus, coordinator, lifecycle, gateway, config: config.clone(), capabilities, limiter };

    let app = session_boundary::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(%addr, "starting swarm-server");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("swarm-server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
