use contracts::AgentOutcome;
use uuid::Uuid;

use crate::plan::Plan;

/// Everything a full swarm run produced: the plan it followed, every primary
/// agent's outcome, and the ids of the synthesis and meta-analysis nodes it
/// wrote (either may be absent if that phase had nothing to work from).
#[derive(Debug, Clone)]
pub struct SwarmResult {
    pub plan: Plan,
    pub agents: Vec<AgentOutcome>,
    pub synthesis_node_id: Option<Uuid>,
    pub meta_node_id: Option<Uuid>,
}

/// The outcome of [`crate::coordinator::SwarmCoordinator::rerun_with_correction`]:
/// a scoped two-agent re-analysis that never touches the parent swarm's state
/// beyond the new nodes and edges it writes.
#[derive(Debug, Clone)]
pub struct RerunSummary {
    pub target_node_id: Uuid,
    pub agents: Vec<AgentOutcome>,
    pub tokens_used: u64,
    pub duration_ms: u64,
}
