use std::sync::Arc;

use contracts::PersistenceGateway;
use event_bus::EventBus;
use lifecycle::LifecycleService;
use reasoning_graph::ReasoningGraph;
use swarm::SwarmCoordinator;
use swarm_config::{ProbeOutcome, SwarmConfig};

use crate::rate_limit::SlidingWindowLimiter;

/// Everything a handler needs, threaded through axum's `State` extractor.
/// Cloning is cheap: every field is an `Arc` (or, for `config`/`capabilities`,
/// effectively read-only after startup).
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<ReasoningGraph>,
    pub bus: Arc<EventBus>,
    pub coordinator: Arc<SwarmCoordinator>,
    pub lifecycle: Arc<LifecycleService>,
    pub gateway: Arc<dyn PersistenceGateway>,
    pub config: Arc<SwarmConfig>,
    pub capabilities: Arc<ProbeOutcome>,
    pub limiter: Arc<SlidingWindowLimiter>,
}
