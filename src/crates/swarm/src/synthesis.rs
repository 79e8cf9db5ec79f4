use std::sync::Arc;

use contracts::{AgentOutcome, AgentRequest, AgentRunner, AgentStatus, Effort, PersistenceGateway};
use event_bus::{EventBus, SwarmEvent};
use reasoning_graph::{AgentRole, EdgeRelation, NodeKind, ReasoningEdge, ReasoningGraph, ReasoningNode};
use uuid::Uuid;

use crate::retry::retry_persistence;

/// Runs the synthesizer sequentially over the Phase 1 results, writes a
/// synthesis node with convergence/divergence lists folded into its content,
/// and links a `Merges` edge from the synthesis node to the
/// highest-confidence node each contributing role wrote.
///
/// Convergence/divergence is judged against the mean confidence across
/// completed Phase 1 outcomes: a role at or above the mean is "converging"
/// with the group's overall confidence, below it is "diverging".
pub async fn run_synthesis(
    graph: &ReasoningGraph,
    bus: &EventBus,
    runner: Arc<dyn AgentRunner>,
    gateway: Arc<dyn PersistenceGateway>,
    session_id: Uuid,
    query: &str,
    phase1: &[AgentOutcome],
) -> Option<Uuid> {
    let completed: Vec<&AgentOutcome> = phase1.iter().filter(|o| o.status == AgentStatus::Completed).collect();
    if completed.is_empty() {
        tracing::warn!(session_id = %session_id, "no completed Phase 1 outcomes; skipping synthesis");
        return None;
    }

    let mean_confidence = completed.iter().map(|o| o.confidence).sum::<f64>() / completed.len() as f64;
    let convergent: Vec<String> = completed.iter().filter(|o| o.confidence >= mean_confidence).map(|o| format!("{:?}", o.agent)).collect();
    let divergent: Vec<String> = completed.iter().filter(|o| o.confidence < mean_confidence).map(|o| format!("{:?}", o.agent)).collect();

    let context = serde_json::json!({
        "phase1": completed.iter().map(|o| serde_json::json!({
            "agent": o.agent,
            "conclusion": o.conclusion,
            "confidence": o.confidence,
        })).collect::<Vec<_>>(),
    });

    let request = AgentRequest::new(session_id, query, Effort::High).with_context(context);
    let outcome = runner.run(AgentRole::Synthesizer, request).await;

    let content = if outcome.status == AgentStatus::Completed && !outcome.conclusion.is_empty() {
        outcome.conclusion.clone()
    } else {
        "synthesis agent produced no usable conclusion".to_string()
    };
    let full_content = format!(
        "{content}\n\nConvergence: {}\nDivergence: {}",
        if convergent.is_empty() { "none".to_string() } else { convergent.join(", ") },
        if divergent.is_empty() { "none".to_string() } else { divergent.join(", ") },
    );

    let synthesis_confidence = if outcome.status == AgentStatus::Completed { outcome.confidence } else { mean_confidence };
    let node = ReasoningNode::new(session_id, AgentRole::Synthesizer, full_content, synthesis_confidence).with_kind(NodeKind::Synthesis);
    let synthesis_node_id = graph.add_node(node.clone());

    for role in [AgentRole::Analyst, AgentRole::Contrarian, AgentRole::Verifier] {
        if let Some(best) = completed
            .iter()
            .filter(|o| o.agent == role && !o.node_ids.is_empty())
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
        {
            let edge = ReasoningEdge::new(synthesis_node_id, best.node_ids[0], EdgeRelation::Merges, best.confidence);
            if let Err(err) = graph.add_edge(edge.clone()) {
                tracing::warn!(%err, "skipping merges edge that would close a cycle");
                continue;
            }
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                let result = retry_persistence("sync_edge", || {
                    let edge = edge.clone();
                    let gateway = Arc::clone(&gateway);
                    async move { gateway.sync_edge(&edge).await }
                })
                .await;
                if let Err(err) = result {
                    tracing::debug!(%err, "merges edge mirror write failed");
                }
            });
        }
    }

    bus.publish(session_id, SwarmEvent::SynthesisReady { session_id, timestamp: chrono::Utc::now(), node_id: synthesis_node_id });

    let gateway = Arc::clone(&gateway);
    tokio::spawn(async move {
        let result = retry_persistence("sync_node", || {
            let node = node.clone();
            let gateway = Arc::clone(&gateway);
            async move { gateway.sync_node(&node).await }
        })
        .await;
        if let Err(err) = result {
            tracing::debug!(%err, "synthesis node mirror write failed");
        }
    });

    Some(synthesis_node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{NullGateway, ScriptedAgentRunner};

    fn completed(role: AgentRole, confidence: f64, node_id: Uuid) -> AgentOutcome {
        AgentOutcome {
            agent: role,
            status: AgentStatus::Completed,
            reasoning: String::new(),
            conclusion: "conclusion".into(),
            confidence,
            node_ids: vec![node_id],
            tokens_used: 1,
            duration_ms: 1,
        }
    }

    #[tokio::test]
    async fn synthesis_writes_a_node_and_merges_edges_to_each_contributor() {
        let graph = ReasoningGraph::new();
        let bus = EventBus::new();
        let session_id = Uuid::new_v4();
        let analyst_node = graph.add_node(ReasoningNode::new(session_id, AgentRole::Analyst, "a", 0.8));
        let contrarian_node = graph.add_node(ReasoningNode::new(session_id, AgentRole::Contrarian, "c", 0.3));

        let phase1 = vec![completed(AgentRole::Analyst, 0.8, analyst_node), completed(AgentRole::Contrarian, 0.3, contrarian_node)];
        let runner: Arc<dyn AgentRunner> = Arc::new(ScriptedAgentRunner::new(vec![(
            AgentRole::Synthesizer,
            AgentOutcome { agent: AgentRole::Synthesizer, status: AgentStatus::Completed, reasoning: String::new(), conclusion: "synthesized view".into(), confidence: 0.75, node_ids: Vec::new(), tokens_used: 2, duration_ms: 1 },
        )]));
        let gateway: Arc<dyn PersistenceGateway> = Arc::new(NullGateway);

        let node_id = run_synthesis(&graph, &bus, runner, gateway, session_id, "query", &phase1).await.unwrap();
        let node = graph.get_node(node_id).unwrap();
        assert!(node.content.contains("synthesized view"));
        assert!(node.content.contains("Convergence"));

        // One merges edge per contributing role.
        let snapshot = graph.to_snapshot(session_id);
        let merges = snapshot.edges.iter().filter(|e| matches!(e.relation, EdgeRelation::Merges)).count();
        assert_eq!(merges, 2);
    }
}
