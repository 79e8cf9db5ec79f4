//! Router assembly: every route from SPEC_FULL.md §4.5/§6.1/§6.2 wired to its
//! handler, plus CORS and request tracing.

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|origin| origin.parse().ok()).collect();
    if allowed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_origin(allowed).allow_methods(tower_http::cors::Any).allow_headers(tower_http::cors::Any)
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/system/capabilities", get(handlers::capabilities))
        .route("/api/swarm", post(handlers::start_swarm))
        .route("/api/graph/:session_id", get(handlers::get_graph))
        .route("/api/swarm/:session_id/checkpoint", post(handlers::record_checkpoint))
        .route("/api/swarm/:session_id/experiments", get(handlers::list_experiments))
        .route("/api/swarm/experiments/:experiment_id/compare", post(handlers::compare_experiment))
        .route("/api/swarm/experiments/:experiment_id/retain", post(handlers::retain_experiment))
        .route("/ws/:session_id", get(ws::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use contracts::{AgentRunner, NullGateway, PersistenceGateway, ScriptedAgentRunner};
    use event_bus::EventBus;
    use lifecycle::LifecycleService;
    use reasoning_graph::ReasoningGraph;
    use swarm::{CoordinatorSettings, SwarmCoordinator};
    use swarm_config::ProbeOutcome;

    use crate::rate_limit::SlidingWindowLimiter;

    fn test_state() -> AppState {
        let gateway: Arc<dyn PersistenceGateway> = Arc::new(NullGateway);
        let runner: Arc<dyn AgentRunner> = Arc::new(ScriptedAgentRunner::new(Vec::new()));
        let graph = Arc::new(ReasoningGraph::new());
        let bus = Arc::new(EventBus::new());
        let coordinator =
            Arc::new(SwarmCoordinator::new(graph.clone(), bus.clone(), runner, gateway.clone(), CoordinatorSettings::default()));
        let lifecycle = Arc::new(LifecycleService::new(gateway.clone()));
        let config = Arc::new(swarm_config::SwarmConfig {
            anthropic_api_key: "key".into(),
            auth_secret: "a-reasonably-long-secret".into(),
            supabase_url: None,
            supabase_service_role_key: None,
            host: "0.0.0.0".into(),
            port: 8080,
            cors_origins: vec!["http://localhost:3000".into()],
            rate_limit_requests: 20,
            rate_limit_window_seconds: 60,
            agent_timeout_seconds: 120,
            agent_stagger_seconds: 2.5,
            max_concurrent_agents: 6,
            voyage_api_key: None,
            voyage_model: None,
            neo4j_uri: None,
            neo4j_user: None,
            neo4j_password: None,
        });
        AppState {
            graph,
            bus,
            coordinator,
            lifecycle,
            gateway,
            config,
            capabilities: Arc::new(ProbeOutcome { snapshot: Default::default(), degraded_reason: Some("test".into()) }),
            limiter: Arc::new(SlidingWindowLimiter::new(20, std::time::Duration::from_secs(60))),
        }
    }

    #[tokio::test]
    async fn router_builds_without_panicking() {
        let _router = create_router(test_state());
    }
}
