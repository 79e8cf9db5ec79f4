//! In-memory test doubles for the two contracts in this crate. Neither talks
//! to a real model or a real database; both exist so the coordinator can be
//! exercised in tests without either.

use async_trait::async_trait;
use reasoning_graph::{AgentRole, ReasoningEdge, ReasoningNode};
use std::sync::Mutex;
use uuid::Uuid;

use crate::agent_runner::AgentRunner;
use crate::error::PersistenceError;
use crate::persistence_gateway::PersistenceGateway;
use crate::types::{
    AgentOutcome, AgentRequest, AgentStatus, CapabilitiesSnapshot, ExperimentAction, ExperimentPatch,
    RehydrationRunRecord, RetrievedArtifact, RetrievedHypothesis,
};

/// An [`AgentRunner`] driven by a fixed, ordered script of outcomes rather
/// than a model. Each call to [`AgentRunner::run`] consumes the next scripted
/// outcome for the requested role, falling back to a bland "completed" stub
/// if the script runs dry so a misconfigured test fails loudly on an
/// assertion rather than panicking mid-run.
pub struct ScriptedAgentRunner {
    script: Mutex<Vec<(AgentRole, AgentOutcome)>>,
}

impl ScriptedAgentRunner {
    pub fn new(script: Vec<(AgentRole, AgentOutcome)>) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl AgentRunner for ScriptedAgentRunner {
    async fn run(&self, role: AgentRole, _request: AgentRequest) -> AgentOutcome {
        let mut script = self.script.lock().unwrap();
        if let Some(pos) = script.iter().position(|(r, _)| *r == role) {
            let (_, outcome) = script.remove(pos);
            outcome
        } else {
            AgentOutcome {
                agent: role,
                status: AgentStatus::Completed,
                reasoning: String::new(),
                conclusion: String::new(),
                confidence: 0.5,
                node_ids: Vec::new(),
                tokens_used: 0,
                duration_ms: 0,
            }
        }
    }
}

/// A [`PersistenceGateway`] that reports no external store configured at all.
/// Every mutation returns [`PersistenceError::CapabilityAbsent`]; every search
/// returns empty results. Used to exercise the "degraded mode" path: the
/// coordinator and lifecycle service must keep working with this as their
/// only gateway.
#[derive(Default)]
pub struct NullGateway;

#[async_trait]
impl PersistenceGateway for NullGateway {
    async fn sync_node(&self, _node: &ReasoningNode) -> Result<(), PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("no persistence backend configured".into()))
    }

    async fn sync_edge(&self, _edge: &ReasoningEdge) -> Result<(), PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("no persistence backend configured".into()))
    }

    async fn backfill_node_tokens(
        &self,
        _node_ids: &[Uuid],
        _tokens_used: u64,
        _agent: AgentRole,
    ) -> Result<(), PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("no persistence backend configured".into()))
    }

    async fn create_hypothesis_experiment(&self, _session_id: Uuid, _statement: &str) -> Result<Uuid, PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("hypothesis experiment mirror not configured".into()))
    }

    async fn update_hypothesis_experiment(
        &self,
        _experiment_id: Uuid,
        _patch: ExperimentPatch,
    ) -> Result<(), PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("hypothesis experiment mirror not configured".into()))
    }

    async fn create_hypothesis_experiment_action(
        &self,
        _experiment_id: Uuid,
        _action: ExperimentAction,
    ) -> Result<(), PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("hypothesis experiment mirror not configured".into()))
    }

    async fn get_hypothesis_experiment(&self, _experiment_id: Uuid) -> Result<Option<serde_json::Value>, PersistenceError> {
        Ok(None)
    }

    async fn list_session_hypothesis_experiments(
        &self,
        _session_id: Uuid,
        _status: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<serde_json::Value>, PersistenceError> {
        Ok(Vec::new())
    }

    async fn generate_reasoning_embedding(&self, _text: &str) -> Result<Vec<f32>, PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("embedding generation not configured".into()))
    }

    async fn search_reasoning_artifacts(
        &self,
        _embedding: &[f32],
        _similarity_threshold: f64,
        _limit: usize,
        _session_id: Option<Uuid>,
    ) -> Result<Vec<RetrievedArtifact>, PersistenceError> {
        Ok(Vec::new())
    }

    async fn search_structured_reasoning_hypotheses_semantic(
        &self,
        _embedding: &[f32],
        _similarity_threshold: f64,
        _limit: usize,
        _session_id: Option<Uuid>,
        _status: Option<&str>,
    ) -> Result<Vec<RetrievedHypothesis>, PersistenceError> {
        Ok(Vec::new())
    }

    async fn create_session_rehydration_run(&self, _run: RehydrationRunRecord) -> Result<(), PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("rehydration run log not configured".into()))
    }

    async fn mark_reasoning_artifact_used(&self, _artifact_id: Uuid) -> Result<(), PersistenceError> {
        Err(PersistenceError::CapabilityAbsent("no persistence backend configured".into()))
    }

    async fn probe_capabilities(&self) -> Result<CapabilitiesSnapshot, PersistenceError> {
        Ok(CapabilitiesSnapshot::default())
    }

    fn get_capabilities_snapshot(&self) -> CapabilitiesSnapshot {
        CapabilitiesSnapshot::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_runner_returns_the_matching_role_outcome() {
        let runner = ScriptedAgentRunner::new(vec![(
            AgentRole::Analyst,
            AgentOutcome {
                agent: AgentRole::Analyst,
                status: AgentStatus::Completed,
                reasoning: "scripted".into(),
                conclusion: "done".into(),
                confidence: 0.9,
                node_ids: Vec::new(),
                tokens_used: 42,
                duration_ms: 10,
            },
        )]);

        let session_id = Uuid::new_v4();
        let request = AgentRequest::new(session_id, "query", crate::types::Effort::High);
        let outcome = runner.run(AgentRole::Analyst, request).await;
        assert_eq!(outcome.reasoning, "scripted");
        assert_eq!(outcome.tokens_used, 42);
    }

    #[tokio::test]
    async fn scripted_runner_falls_back_when_script_is_exhausted() {
        let runner = ScriptedAgentRunner::new(Vec::new());
        let request = AgentRequest::new(Uuid::new_v4(), "query", crate::types::Effort::Medium);
        let outcome = runner.run(AgentRole::Contrarian, request).await;
        assert_eq!(outcome.status, AgentStatus::Completed);
        assert_eq!(outcome.agent, AgentRole::Contrarian);
    }

    #[tokio::test]
    async fn null_gateway_reports_no_capabilities() {
        let gateway = NullGateway;
        let snapshot = gateway.probe_capabilities().await.unwrap();
        assert!(!snapshot.configured);
        assert!(!snapshot.lifecycle_ready);
        assert!(!snapshot.rehydration_ready);
    }

    #[tokio::test]
    async fn null_gateway_mutations_surface_as_capability_absent() {
        let gateway = NullGateway;
        let session_id = Uuid::new_v4();
        let err = gateway
            .create_hypothesis_experiment(session_id, "statement")
            .await
            .unwrap_err();
        assert!(err.is_capability_absent());
    }
}
