use std::sync::Arc;

use contracts::{AgentRequest, AgentRunner, AgentStatus, Effort, PersistenceGateway};
use event_bus::{EventBus, SwarmEvent};
use reasoning_graph::{AgentRole, NodeKind, ReasoningGraph, ReasoningNode};
use uuid::Uuid;

use crate::retry::retry_persistence;

const REQUIRED_CATEGORIES: [(&str, &str); 3] =
    [("bias-detection", "bias"), ("pattern", "pattern"), ("improvement-hypothesis", "improvement")];
const MAX_TURNS: usize = 3;

fn missing_categories(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    REQUIRED_CATEGORIES.iter().filter(|(_, keyword)| !lower.contains(keyword)).map(|(label, _)| *label).collect()
}

/// Whether the contrarian produced only `Supports` relations against analyst
/// nodes in this session, with zero `Challenges` — the groupthink signal.
fn contrarian_is_groupthink(graph: &ReasoningGraph, session_id: Uuid) -> bool {
    let analyst_node_ids: Vec<Uuid> =
        graph.get_session_nodes(session_id).into_iter().filter(|n| n.agent == AgentRole::Analyst).map(|n| n.id).collect();

    let mut challenges = 0;
    let mut supports = 0;
    for id in analyst_node_ids {
        challenges += graph.get_challenges_for(id).into_iter().filter(|(_, source)| source.agent == AgentRole::Contrarian).count();
        supports += graph.get_supports_for(id).into_iter().filter(|(_, source)| source.agent == AgentRole::Contrarian).count();
    }
    supports > 0 && challenges == 0
}

/// Runs the meta agent over the full session graph, issuing up to
/// [`MAX_TURNS`] follow-up turns until the three required insight categories
/// (bias detection, pattern, improvement hypothesis) are covered or the turn
/// budget runs out. Writes one `MetaInsight` node with the combined output,
/// and a second, explicit groupthink-flag insight when the contrarian
/// produced only support relations against the analyst.
pub async fn run_meta_analysis(
    graph: &ReasoningGraph,
    bus: &EventBus,
    runner: Arc<dyn AgentRunner>,
    gateway: Arc<dyn PersistenceGateway>,
    session_id: Uuid,
    query: &str,
) -> Option<Uuid> {
    let session_nodes = graph.get_session_nodes(session_id);
    if session_nodes.is_empty() {
        tracing::warn!(session_id = %session_id, "no reasoning nodes to observe; skipping meta-analysis");
        return None;
    }

    let graph_context = serde_json::json!({ "node_count": session_nodes.len() });
    let mut combined = String::new();
    let mut last_confidence = 0.0;

    for turn in 0..MAX_TURNS {
        let missing = missing_categories(&combined);
        if turn > 0 && missing.is_empty() {
            break;
        }
        let prompt = if turn == 0 {
            query.to_string()
        } else {
            format!("{query}\n\nFollow-up turn {turn}: still missing coverage of {}", missing.join(", "))
        };

        let request = AgentRequest::new(session_id, prompt, Effort::High).with_context(graph_context.clone());
        let outcome = runner.run(AgentRole::Meta, request).await;
        if outcome.status == AgentStatus::Completed && !outcome.conclusion.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(&outcome.conclusion);
            last_confidence = outcome.confidence;
        }

        if missing_categories(&combined).is_empty() {
            break;
        }
    }

    if combined.is_empty() {
        combined = "meta-analysis produced no usable conclusion".to_string();
    }

    let node = ReasoningNode::new(session_id, AgentRole::Meta, combined, last_confidence).with_kind(NodeKind::MetaInsight);
    let node_id = graph.add_node(node.clone());

    let gateway_for_sync = Arc::clone(&gateway);
    tokio::spawn(async move {
        let result = retry_persistence("sync_node", || {
            let node = node.clone();
            let gateway = Arc::clone(&gateway_for_sync);
            async move { gateway.sync_node(&node).await }
        })
        .await;
        if let Err(err) = result {
            tracing::debug!(%err, "meta node mirror write failed");
        }
    });

    if contrarian_is_groupthink(graph, session_id) {
        bus.publish(
            session_id,
            SwarmEvent::MetaInsight {
                session_id,
                timestamp: chrono::Utc::now(),
                insight_type: "groupthink".to_string(),
                description: "contrarian produced only support relations against the analyst; no dissent was recorded".to_string(),
                affected_agents: vec!["contrarian".to_string(), "analyst".to_string()],
            },
        );
    }

    Some(node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AgentOutcome, NullGateway, ScriptedAgentRunner};
    use reasoning_graph::{EdgeRelation, ReasoningEdge};

    fn meta_outcome(conclusion: &str) -> AgentOutcome {
        AgentOutcome {
            agent: AgentRole::Meta,
            status: AgentStatus::Completed,
            reasoning: String::new(),
            conclusion: conclusion.to_string(),
            confidence: 0.7,
            node_ids: Vec::new(),
            tokens_used: 3,
            duration_ms: 1,
        }
    }

    #[tokio::test]
    async fn stops_early_once_all_categories_are_covered() {
        let graph = ReasoningGraph::new();
        let bus = EventBus::new();
        let session_id = Uuid::new_v4();
        graph.add_node(ReasoningNode::new(session_id, AgentRole::Analyst, "a", 0.8));

        let runner: Arc<dyn AgentRunner> = Arc::new(ScriptedAgentRunner::new(vec![(
            AgentRole::Meta,
            meta_outcome("covers bias, pattern, and improvement all at once"),
        )]));
        let gateway: Arc<dyn PersistenceGateway> = Arc::new(NullGateway);

        let node_id = run_meta_analysis(&graph, &bus, runner, gateway, session_id, "query").await.unwrap();
        let node = graph.get_node(node_id).unwrap();
        assert!(node.content.contains("bias"));
    }

    #[tokio::test]
    async fn flags_groupthink_when_contrarian_only_supports() {
        let graph = ReasoningGraph::new();
        let bus = EventBus::new();
        let mut sub = bus.subscribe(Uuid::nil());
        let session_id = Uuid::new_v4();
        let analyst = graph.add_node(ReasoningNode::new(session_id, AgentRole::Analyst, "a", 0.8));
        let contrarian = graph.add_node(ReasoningNode::new(session_id, AgentRole::Contrarian, "c", 0.8));
        graph.add_edge(ReasoningEdge::new(contrarian, analyst, EdgeRelation::Supports, 0.8)).unwrap();
        drop(sub);
        sub = bus.subscribe(session_id);

        let runner: Arc<dyn AgentRunner> = Arc::new(ScriptedAgentRunner::new(vec![(AgentRole::Meta, meta_outcome("no real insight"))]));
        let gateway: Arc<dyn PersistenceGateway> = Arc::new(NullGateway);

        run_meta_analysis(&graph, &bus, runner, gateway, session_id, "query").await;

        let mut saw_groupthink = false;
        while let Ok(event) = sub.receiver.try_recv() {
            if let SwarmEvent::MetaInsight { insight_type, .. } = event {
                saw_groupthink = insight_type == "groupthink";
            }
        }
        assert!(saw_groupthink);
    }
}
