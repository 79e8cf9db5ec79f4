use async_trait::async_trait;
use reasoning_graph::{AgentRole, ReasoningEdge, ReasoningNode};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::types::{
    CapabilitiesSnapshot, ExperimentAction, ExperimentPatch, RehydrationRunRecord, RetrievedArtifact,
    RetrievedHypothesis,
};

/// The external store the coordinator mirrors its state into. Every method
/// returns a `Result` so callers can tell a transient failure (retry it) from
/// a capability that was never configured (skip it and carry on): see
/// [`PersistenceError`].
///
/// The in-memory graph and lifecycle state are always authoritative; this
/// gateway is a best-effort mirror, never a dependency the swarm blocks on.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn sync_node(&self, node: &ReasoningNode) -> Result<(), PersistenceError>;

    async fn sync_edge(&self, edge: &ReasoningEdge) -> Result<(), PersistenceError>;

    async fn backfill_node_tokens(
        &self,
        node_ids: &[Uuid],
        tokens_used: u64,
        agent: AgentRole,
    ) -> Result<(), PersistenceError>;

    async fn create_hypothesis_experiment(
        &self,
        session_id: Uuid,
        statement: &str,
    ) -> Result<Uuid, PersistenceError>;

    async fn update_hypothesis_experiment(
        &self,
        experiment_id: Uuid,
        patch: ExperimentPatch,
    ) -> Result<(), PersistenceError>;

    async fn create_hypothesis_experiment_action(
        &self,
        experiment_id: Uuid,
        action: ExperimentAction,
    ) -> Result<(), PersistenceError>;

    async fn get_hypothesis_experiment(
        &self,
        experiment_id: Uuid,
    ) -> Result<Option<serde_json::Value>, PersistenceError>;

    async fn list_session_hypothesis_experiments(
        &self,
        session_id: Uuid,
        status: Option<&str>,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>, PersistenceError>;

    async fn generate_reasoning_embedding(&self, text: &str) -> Result<Vec<f32>, PersistenceError>;

    async fn search_reasoning_artifacts(
        &self,
        embedding: &[f32],
        similarity_threshold: f64,
        limit: usize,
        session_id: Option<Uuid>,
    ) -> Result<Vec<RetrievedArtifact>, PersistenceError>;

    async fn search_structured_reasoning_hypotheses_semantic(
        &self,
        embedding: &[f32],
        similarity_threshold: f64,
        limit: usize,
        session_id: Option<Uuid>,
        status: Option<&str>,
    ) -> Result<Vec<RetrievedHypothesis>, PersistenceError>;

    async fn create_session_rehydration_run(&self, run: RehydrationRunRecord) -> Result<(), PersistenceError>;

    async fn mark_reasoning_artifact_used(&self, artifact_id: Uuid) -> Result<(), PersistenceError>;

    async fn probe_capabilities(&self) -> Result<CapabilitiesSnapshot, PersistenceError>;

    /// Cached result of the last [`Self::probe_capabilities`] call. Never
    /// fails: a gateway that hasn't probed yet returns the all-`false`
    /// default.
    fn get_capabilities_snapshot(&self) -> CapabilitiesSnapshot;
}
