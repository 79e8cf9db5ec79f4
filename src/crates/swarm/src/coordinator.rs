use std::sync::Arc;

use contracts::{AgentRunner, Effort, PersistenceGateway};
use event_bus::{EventBus, SwarmEvent};
use reasoning_graph::{AgentRole, ReasoningGraph};
use rehydration::RehydrationMetrics;
use uuid::Uuid;

use crate::meta;
use crate::phase1;
use crate::plan::{self, PlannedAgent};
use crate::result::{RerunSummary, SwarmResult};
use crate::settings::CoordinatorSettings;
use crate::synthesis;
use crate::wire::kebab;

/// Owns the four collaborators a swarm run touches — the reasoning graph, the
/// event bus, the agent runner, and the persistence gateway — and drives the
/// rehydrate → plan → analyze → synthesize → reflect pipeline over them.
pub struct SwarmCoordinator {
    graph: Arc<ReasoningGraph>,
    bus: Arc<EventBus>,
    runner: Arc<dyn AgentRunner>,
    gateway: Arc<dyn PersistenceGateway>,
    rehydration_metrics: RehydrationMetrics,
    settings: CoordinatorSettings,
}

impl SwarmCoordinator {
    pub fn new(
        graph: Arc<ReasoningGraph>,
        bus: Arc<EventBus>,
        runner: Arc<dyn AgentRunner>,
        gateway: Arc<dyn PersistenceGateway>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self { graph, bus, runner, gateway, rehydration_metrics: RehydrationMetrics::default(), settings }
    }

    pub fn graph(&self) -> &ReasoningGraph {
        &self.graph
    }

    pub fn rehydration_metrics(&self) -> &RehydrationMetrics {
        &self.rehydration_metrics
    }

    async fn rehydrated_query(&self, session_id: Uuid, query: &str) -> String {
        if !self.gateway.get_capabilities_snapshot().rehydration_ready {
            return query.to_string();
        }
        rehydration::rehydrate(self.gateway.as_ref(), &self.rehydration_metrics, session_id, query).await.augmented_query
    }

    /// Runs the full four-phase pipeline for a new query: rehydration,
    /// planning, parallel primary analysis, synthesis, and meta-analysis.
    #[tracing::instrument(skip(self, query), fields(session_id = %session_id))]
    pub async fn run(&self, session_id: Uuid, query: &str) -> SwarmResult {
        self.bus.publish(session_id, SwarmEvent::SwarmStarted { session_id, timestamp: chrono::Utc::now() });

        let augmented_query = self.rehydrated_query(session_id, query).await;

        let plan = plan::run_planner(self.runner.as_ref(), session_id, &augmented_query, self.settings.planner_deadline).await;
        self.bus.publish(
            session_id,
            SwarmEvent::MaestroDecomposition {
                session_id,
                timestamp: chrono::Utc::now(),
                agents: plan.agents.iter().map(|a| kebab(&a.role)).collect(),
                subtasks: plan.subtasks.clone(),
            },
        );

        let context = serde_json::json!({ "rationale": plan.rationale, "subtasks": plan.subtasks });
        let agents = phase1::run_primary_agents(
            &self.graph,
            &self.bus,
            Arc::clone(&self.runner),
            Arc::clone(&self.gateway),
            session_id,
            &augmented_query,
            &plan.agents,
            &self.settings,
            context,
        )
        .await;

        let synthesis_node_id = synthesis::run_synthesis(
            &self.graph,
            &self.bus,
            Arc::clone(&self.runner),
            Arc::clone(&self.gateway),
            session_id,
            &augmented_query,
            &agents,
        )
        .await;

        let meta_node_id =
            meta::run_meta_analysis(&self.graph, &self.bus, Arc::clone(&self.runner), Arc::clone(&self.gateway), session_id, &augmented_query)
                .await;

        SwarmResult { plan, agents, synthesis_node_id, meta_node_id }
    }

    /// Re-runs only the analyst and contrarian against a human correction
    /// targeting one existing node. Scoped and additive: it writes new nodes
    /// and edges but never mutates or cancels the parent swarm run.
    #[tracing::instrument(skip(self, correction), fields(session_id = %session_id, target_node_id = %target_node_id))]
    pub async fn rerun_with_correction(&self, session_id: Uuid, target_node_id: Uuid, correction: &str) -> Option<RerunSummary> {
        let target = self.graph.get_node(target_node_id)?;

        self.bus.publish(session_id, SwarmEvent::SwarmRerunStarted { session_id, timestamp: chrono::Utc::now(), target_node_id });

        let query = format!("{}\n\nHuman correction: {}", target.content, correction);
        let augmented_query = self.rehydrated_query(session_id, &query).await;

        let agents = [
            PlannedAgent { role: AgentRole::Analyst, effort: Effort::High },
            PlannedAgent { role: AgentRole::Contrarian, effort: Effort::High },
        ];
        let context = serde_json::json!({ "correcting_node_id": target_node_id });
        let outcomes = phase1::run_primary_agents(
            &self.graph,
            &self.bus,
            Arc::clone(&self.runner),
            Arc::clone(&self.gateway),
            session_id,
            &augmented_query,
            &agents,
            &self.settings,
            context,
        )
        .await;

        let tokens_used = outcomes.iter().map(|o| o.tokens_used).sum();
        let duration_ms = outcomes.iter().map(|o| o.duration_ms).max().unwrap_or(0);
        Some(RerunSummary { target_node_id, agents: outcomes, tokens_used, duration_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AgentOutcome, AgentStatus, NullGateway, ScriptedAgentRunner};

    fn outcome(role: AgentRole, confidence: f64) -> AgentOutcome {
        AgentOutcome {
            agent: role,
            status: AgentStatus::Completed,
            reasoning: "because".into(),
            conclusion: "covers bias, pattern, and improvement".into(),
            confidence,
            node_ids: Vec::new(),
            tokens_used: 4,
            duration_ms: 1,
        }
    }

    fn coordinator() -> SwarmCoordinator {
        let runner: Arc<dyn AgentRunner> = Arc::new(ScriptedAgentRunner::new(vec![
            (AgentRole::Analyst, outcome(AgentRole::Analyst, 0.8)),
            (AgentRole::Contrarian, outcome(AgentRole::Contrarian, 0.3)),
            (AgentRole::Verifier, outcome(AgentRole::Verifier, 0.9)),
            (AgentRole::Synthesizer, outcome(AgentRole::Synthesizer, 0.85)),
            (AgentRole::Meta, outcome(AgentRole::Meta, 0.6)),
        ]));
        let settings = CoordinatorSettings { agent_stagger: std::time::Duration::ZERO, ..CoordinatorSettings::default() };
        SwarmCoordinator::new(Arc::new(ReasoningGraph::new()), Arc::new(EventBus::new()), runner, Arc::new(NullGateway), settings)
    }

    #[tokio::test]
    async fn a_full_run_produces_a_plan_three_agents_and_both_later_phases() {
        let coordinator = coordinator();
        let session_id = Uuid::new_v4();
        let result = coordinator.run(session_id, "why did throughput drop").await;

        assert_eq!(result.agents.len(), 3);
        assert!(result.synthesis_node_id.is_some());
        assert!(result.meta_node_id.is_some());
    }

    #[tokio::test]
    async fn rerun_with_correction_only_touches_analyst_and_contrarian() {
        let coordinator = coordinator();
        let session_id = Uuid::new_v4();
        let result = coordinator.run(session_id, "why did throughput drop").await;
        let target = result.agents.iter().find(|o| o.agent == AgentRole::Analyst).unwrap().node_ids[0];

        let rerun = coordinator.rerun_with_correction(session_id, target, "consider the cache eviction path instead").await.unwrap();
        assert_eq!(rerun.agents.len(), 2);
        assert!(rerun.agents.iter().all(|o| o.agent == AgentRole::Analyst || o.agent == AgentRole::Contrarian));
    }

    #[tokio::test]
    async fn rerun_against_an_unknown_node_returns_none() {
        let coordinator = coordinator();
        let rerun = coordinator.rerun_with_correction(Uuid::new_v4(), Uuid::new_v4(), "nope").await;
        assert!(rerun.is_none());
    }
}
