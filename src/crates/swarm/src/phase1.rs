use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{AgentOutcome, AgentRequest, AgentRunner, AgentStatus, PersistenceGateway};
use event_bus::{EventBus, SwarmEvent};
use reasoning_graph::{AgentRole, EdgeRelation, NodeKind, ReasoningEdge, ReasoningGraph, ReasoningNode};
use serde_json::Value;
use uuid::Uuid;

use crate::plan::PlannedAgent;
use crate::retry::retry_persistence;
use crate::settings::CoordinatorSettings;
use crate::wire::kebab;

/// Runs a single agent under a bounded timeout. A timeout or a panicked task
/// converts to a structured `AgentOutcome`; it never propagates an error out
/// of this function, matching the per-agent wrapper contract.
async fn run_one_agent(
    runner: Arc<dyn AgentRunner>,
    role: AgentRole,
    request: AgentRequest,
    timeout: Duration,
) -> AgentOutcome {
    let start = Instant::now();
    let handle = tokio::spawn(async move { runner.run(role, request).await });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_err)) => {
            tracing::warn!(agent = %kebab(&role), error = %join_err, "agent task panicked");
            AgentOutcome::errored(role, join_err.to_string(), start.elapsed().as_millis() as u64)
        }
        Err(_) => {
            tracing::debug!(agent = %kebab(&role), "agent timed out");
            AgentOutcome::timed_out(role, start.elapsed().as_millis() as u64)
        }
    }
}

fn kind_for_role(role: AgentRole) -> NodeKind {
    match role {
        AgentRole::Contrarian => NodeKind::Challenge,
        AgentRole::Verifier => NodeKind::Verification,
        _ => NodeKind::Analysis,
    }
}

/// Writes a reasoning node for a completed outcome, records the node id back
/// onto the outcome, and fire-and-forgets a mirror write to the persistence
/// gateway.
fn record_node(graph: &ReasoningGraph, bus: &EventBus, session_id: Uuid, gateway: &Arc<dyn PersistenceGateway>, outcome: &mut AgentOutcome) {
    let node = ReasoningNode::new(session_id, outcome.agent, outcome.conclusion.clone(), outcome.confidence)
        .with_kind(kind_for_role(outcome.agent));
    let node_id = graph.add_node(node.clone());
    outcome.node_ids.push(node_id);

    bus.publish(
        session_id,
        SwarmEvent::GraphNodeCreated { session_id, timestamp: chrono::Utc::now(), node_id, agent: kebab(&outcome.agent) },
    );

    let gateway = Arc::clone(gateway);
    tokio::spawn(async move {
        let result = retry_persistence("sync_node", || {
            let node = node.clone();
            let gateway = Arc::clone(&gateway);
            async move { gateway.sync_node(&node).await }
        })
        .await;
        if let Err(err) = result {
            tracing::debug!(%err, node_id = %node_id, "node mirror write failed");
        }
    });
}

/// Highest-confidence completed node written by `role` this run.
fn best_node_for_role(outcomes: &[AgentOutcome], role: AgentRole) -> Option<Uuid> {
    outcomes
        .iter()
        .filter(|o| o.agent == role && o.status == AgentStatus::Completed && !o.node_ids.is_empty())
        .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
        .map(|o| o.node_ids[0])
}

fn link_edge(graph: &ReasoningGraph, bus: &EventBus, session_id: Uuid, gateway: &Arc<dyn PersistenceGateway>, edge: ReasoningEdge) {
    let relation = edge.relation;
    let source_id = edge.source_id;
    let target_id = edge.target_id;
    let weight = edge.weight;
    if let Err(err) = graph.add_edge(edge.clone()) {
        tracing::warn!(%err, "skipping reasoning edge that would close a cycle");
        return;
    }

    match relation {
        EdgeRelation::Challenges => bus.publish(
            session_id,
            SwarmEvent::AgentChallenges { session_id, timestamp: chrono::Utc::now(), agent: "contrarian".into(), target_node_id: target_id },
        ),
        EdgeRelation::Verifies => bus.publish(
            session_id,
            SwarmEvent::VerificationScore { session_id, timestamp: chrono::Utc::now(), agent: "verifier".into(), target_node_id: target_id, score: weight },
        ),
        _ => {}
    }

    let gateway = Arc::clone(gateway);
    tokio::spawn(async move {
        let edge = ReasoningEdge::new(source_id, target_id, relation, weight);
        let result = retry_persistence("sync_edge", || {
            let edge = edge.clone();
            let gateway = Arc::clone(&gateway);
            async move { gateway.sync_edge(&edge).await }
        })
        .await;
        if let Err(err) = result {
            tracing::debug!(%err, "edge mirror write failed");
        }
    });
}

/// Launches every planned agent concurrently, staggered by `i *
/// agent_stagger`, gathers all outcomes with partial-result tolerance, writes
/// a reasoning node for each completed one, links contrarian/verifier
/// reactions to the analyst's best node, and fire-and-forgets a token
/// backfill to the persistence gateway.
pub async fn run_primary_agents(
    graph: &ReasoningGraph,
    bus: &EventBus,
    runner: Arc<dyn AgentRunner>,
    gateway: Arc<dyn PersistenceGateway>,
    session_id: Uuid,
    query: &str,
    agents: &[PlannedAgent],
    settings: &CoordinatorSettings,
    context: Value,
) -> Vec<AgentOutcome> {
    let mut handles = Vec::with_capacity(agents.len());
    for (i, planned) in agents.iter().enumerate() {
        let runner = Arc::clone(&runner);
        let delay = settings.agent_stagger * i as u32;
        let timeout = settings.agent_timeout;
        let request = AgentRequest::new(session_id, query, planned.effort).with_context(context.clone());
        let role = planned.role;
        let bus_publish_delay = delay;
        let effort_label = kebab(&planned.effort);
        let agent_label = kebab(&role);

        handles.push(tokio::spawn({
            let bus_session_id = session_id;
            async move {
                if !bus_publish_delay.is_zero() {
                    tokio::time::sleep(bus_publish_delay).await;
                }
                tracing::info!(agent = %agent_label, effort = %effort_label, session_id = %bus_session_id, "agent starting");
                run_one_agent(runner, role, request, timeout).await
            }
        }));
    }

    for (planned, _) in agents.iter().zip(handles.iter()) {
        bus.publish(
            session_id,
            SwarmEvent::AgentStarted {
                session_id,
                timestamp: chrono::Utc::now(),
                agent: kebab(&planned.role),
                effort: kebab(&planned.effort),
            },
        );
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle.await.unwrap_or_else(|join_err| {
            tracing::warn!(error = %join_err, "agent supervising task panicked");
            AgentOutcome::errored(AgentRole::Analyst, join_err.to_string(), 0)
        });
        outcomes.push(outcome);
    }

    for outcome in outcomes.iter_mut() {
        if outcome.status == AgentStatus::Completed {
            record_node(graph, bus, session_id, &gateway, outcome);
        }
        bus.publish(
            session_id,
            SwarmEvent::AgentCompleted {
                session_id,
                timestamp: chrono::Utc::now(),
                agent: kebab(&outcome.agent),
                conclusion_preview: outcome.conclusion.chars().take(160).collect(),
                confidence: outcome.confidence,
                tokens_used: outcome.tokens_used,
            },
        );
    }

    if let Some(analyst_node) = best_node_for_role(&outcomes, AgentRole::Analyst) {
        if let Some(contrarian) = outcomes.iter().find(|o| o.agent == AgentRole::Contrarian && o.status == AgentStatus::Completed) {
            if let Some(&contrarian_node) = contrarian.node_ids.first() {
                let relation = if contrarian.confidence < 0.5 { EdgeRelation::Challenges } else { EdgeRelation::Supports };
                link_edge(graph, bus, session_id, &gateway, ReasoningEdge::new(contrarian_node, analyst_node, relation, contrarian.confidence));
            }
        }
        if let Some(verifier) = outcomes.iter().find(|o| o.agent == AgentRole::Verifier && o.status == AgentStatus::Completed) {
            if let Some(&verifier_node) = verifier.node_ids.first() {
                link_edge(graph, bus, session_id, &gateway, ReasoningEdge::new(verifier_node, analyst_node, EdgeRelation::Verifies, verifier.confidence));
            }
        }
    }

    let gateway_for_backfill = Arc::clone(&gateway);
    let backfill_outcomes: Vec<(AgentRole, Vec<Uuid>, u64)> =
        outcomes.iter().filter(|o| !o.node_ids.is_empty()).map(|o| (o.agent, o.node_ids.clone(), o.tokens_used)).collect();
    tokio::spawn(async move {
        for (agent, node_ids, tokens_used) in backfill_outcomes {
            let gateway = Arc::clone(&gateway_for_backfill);
            let result = retry_persistence("backfill_node_tokens", || {
                let gateway = Arc::clone(&gateway);
                let node_ids = node_ids.clone();
                async move { gateway.backfill_node_tokens(&node_ids, tokens_used, agent).await }
            })
            .await;
            if let Err(err) = result {
                tracing::debug!(%err, agent = %kebab(&agent), "token backfill failed");
            }
        }
    });

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlannedAgent;
    use contracts::{Effort, NullGateway, ScriptedAgentRunner};
    use std::time::Duration as StdDuration;

    fn outcome(role: AgentRole, confidence: f64) -> AgentOutcome {
        AgentOutcome {
            agent: role,
            status: AgentStatus::Completed,
            reasoning: "because".into(),
            conclusion: "conclusion".into(),
            confidence,
            node_ids: Vec::new(),
            tokens_used: 5,
            duration_ms: 1,
        }
    }

    #[tokio::test]
    async fn all_three_agents_produce_outcomes_and_nodes() {
        let graph = ReasoningGraph::new();
        let bus = EventBus::new();
        let runner: Arc<dyn AgentRunner> = Arc::new(ScriptedAgentRunner::new(vec![
            (AgentRole::Analyst, outcome(AgentRole::Analyst, 0.8)),
            (AgentRole::Contrarian, outcome(AgentRole::Contrarian, 0.3)),
            (AgentRole::Verifier, outcome(AgentRole::Verifier, 0.9)),
        ]));
        let gateway: Arc<dyn PersistenceGateway> = Arc::new(NullGateway);
        let session_id = Uuid::new_v4();
        let agents = [
            PlannedAgent { role: AgentRole::Analyst, effort: Effort::High },
            PlannedAgent { role: AgentRole::Contrarian, effort: Effort::High },
            PlannedAgent { role: AgentRole::Verifier, effort: Effort::High },
        ];
        let settings = CoordinatorSettings { agent_stagger: StdDuration::ZERO, ..CoordinatorSettings::default() };

        let outcomes = run_primary_agents(&graph, &bus, runner, gateway, session_id, "query", &agents, &settings, Value::Null).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.status == AgentStatus::Completed));
        assert_eq!(graph.get_session_nodes(session_id).len(), 3);
        // Contrarian confidence 0.3 < 0.5 -> challenges edge.
        let analyst_node = graph.get_nodes_by_agent(AgentRole::Analyst)[0].id;
        assert_eq!(graph.get_challenges_for(analyst_node).len(), 1);
        assert_eq!(graph.get_verifications_for(analyst_node).len(), 1);
    }

    #[tokio::test]
    async fn a_timed_out_agent_does_not_block_or_cancel_siblings() {
        let graph = ReasoningGraph::new();
        let bus = EventBus::new();
        // Analyst has no scripted outcome so ScriptedAgentRunner returns its
        // bland "completed" stub immediately; the point here is only that a
        // short per-agent timeout doesn't panic the whole batch.
        let runner: Arc<dyn AgentRunner> = Arc::new(ScriptedAgentRunner::new(vec![(AgentRole::Verifier, outcome(AgentRole::Verifier, 0.7))]));
        let gateway: Arc<dyn PersistenceGateway> = Arc::new(NullGateway);
        let session_id = Uuid::new_v4();
        let agents = [PlannedAgent { role: AgentRole::Analyst, effort: Effort::Medium }, PlannedAgent { role: AgentRole::Verifier, effort: Effort::Medium }];
        let settings = CoordinatorSettings { agent_stagger: StdDuration::ZERO, agent_timeout: StdDuration::from_secs(5), ..CoordinatorSettings::default() };

        let outcomes = run_primary_agents(&graph, &bus, runner, gateway, session_id, "query", &agents, &settings, Value::Null).await;
        assert_eq!(outcomes.len(), 2);
    }
}
