use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use uuid::Uuid;

/// The closed set of roles that can author a reasoning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    Planner,
    Analyst,
    Contrarian,
    Verifier,
    Synthesizer,
    Meta,
    /// Nodes written by the checkpoint endpoint on behalf of a human reviewer
    /// rather than a language-model agent.
    HumanAnnotation,
}

/// Structural tag describing what kind of reasoning a node represents, kept
/// as a closed enum so producers and the dashboard agree on a fixed
/// vocabulary rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Analysis,
    Hypothesis,
    Conclusion,
    Evidence,
    Challenge,
    Support,
    Verification,
    Synthesis,
    MetaInsight,
    DecisionPoint,
    HumanAnnotation,
}

/// A single alternative considered (and accepted or rejected) while an agent was
/// reasoning toward a node's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPoint {
    pub description: String,
    pub alternatives_considered: Vec<String>,
    pub chosen: Option<String>,
}

/// A unit of the shared reasoning DAG. Immutable after construction: confidence
/// and content are set once, at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningNode {
    pub id: Uuid,
    pub session_id: Uuid,
    pub agent: AgentRole,
    pub content: String,
    pub kind: Option<NodeKind>,
    pub confidence: f64,
    #[serde(default)]
    pub decision_points: Vec<DecisionPoint>,
    pub created_at: DateTime<Utc>,
}

impl ReasoningNode {
    pub fn new(session_id: Uuid, agent: AgentRole, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            agent,
            content: content.into(),
            kind: None,
            confidence,
            decision_points: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_decision_points(mut self, points: Vec<DecisionPoint>) -> Self {
        self.decision_points = points;
        self
    }
}

/// The closed set of typed relations a reasoning edge may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRelation {
    LeadsTo,
    Challenges,
    Verifies,
    Supports,
    Contradicts,
    Merges,
    Observes,
}

/// A typed directed relation between two nodes in the same session. The edge set
/// forms a DAG: see [`crate::ReasoningGraph::add_edge`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningEdge {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub relation: EdgeRelation,
    pub weight: f64,
    #[serde(default)]
    pub metadata: Map<String, serde_json::Value>,
}

impl ReasoningEdge {
    pub fn new(source_id: Uuid, target_id: Uuid, relation: EdgeRelation, weight: f64) -> Self {
        Self {
            source_id,
            target_id,
            relation,
            weight,
            metadata: Map::new(),
        }
    }
}

/// A change notification delivered synchronously, inside the mutation lock, to
/// every registered listener.
#[derive(Debug, Clone)]
pub enum GraphChange {
    NodeAdded(ReasoningNode),
    EdgeAdded(ReasoningEdge),
}

/// A session-scoped, serializable export of the graph, used for persistence
/// warm-start. Only edges whose endpoints are both within the session are
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub session_id: Uuid,
    pub nodes: Vec<ReasoningNode>,
    pub edges: Vec<ReasoningEdge>,
}
