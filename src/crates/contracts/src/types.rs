use chrono::{DateTime, Utc};
use reasoning_graph::AgentRole;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// How hard an agent should think. Mirrors the model's own effort levels
/// rather than inventing a crate-local scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effort {
    Low,
    Medium,
    High,
    Max,
}

/// Everything an [`crate::AgentRunner`] needs to produce one reasoning node:
/// the query it's reasoning about, how hard to think, and whatever prior
/// context the coordinator has assembled (rehydrated artifacts, sibling node
/// summaries, a correction to re-run against).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub session_id: Uuid,
    pub query: String,
    pub effort: Effort,
    #[serde(default)]
    pub context: Value,
}

impl AgentRequest {
    pub fn new(session_id: Uuid, query: impl Into<String>, effort: Effort) -> Self {
        Self {
            session_id,
            query: query.into(),
            effort,
            context: Value::Null,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// Why an agent invocation finished the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentStatus {
    Completed,
    Timeout,
    Error,
}

/// The result of one [`crate::AgentRunner::run`] call. A timed-out or errored
/// agent still returns an `AgentOutcome` rather than an `Err`: the coordinator
/// treats a missing contribution as a degraded result, not a fatal one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub agent: AgentRole,
    pub status: AgentStatus,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub conclusion: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub node_ids: Vec<Uuid>,
    #[serde(default)]
    pub tokens_used: u64,
    pub duration_ms: u64,
}

impl AgentOutcome {
    pub fn timed_out(agent: AgentRole, duration_ms: u64) -> Self {
        Self {
            agent,
            status: AgentStatus::Timeout,
            reasoning: String::new(),
            conclusion: String::new(),
            confidence: 0.0,
            node_ids: Vec::new(),
            tokens_used: 0,
            duration_ms,
        }
    }

    pub fn errored(agent: AgentRole, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            agent,
            status: AgentStatus::Error,
            reasoning: error.into(),
            conclusion: String::new(),
            confidence: 0.0,
            node_ids: Vec::new(),
            tokens_used: 0,
            duration_ms,
        }
    }
}

/// A candidate artifact returned by semantic search over past reasoning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedArtifact {
    pub id: Uuid,
    pub session_id: Uuid,
    pub text: String,
    pub similarity: f64,
    pub importance: f64,
    pub age_days: f64,
    /// Whether this artifact's snapshot records a human `retain` decision.
    #[serde(default)]
    pub retained: bool,
}

impl RetrievedArtifact {
    pub fn retention_bonus(&self) -> f64 {
        if self.retained {
            1.0
        } else {
            0.0
        }
    }
}

/// A candidate past hypothesis experiment returned by semantic search.
///
/// Carries the same `importance`/`age_days` fields as [`RetrievedArtifact`] so
/// the rehydration scorer can rank artifacts and hypotheses on one composite
/// scale instead of two incompatible ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedHypothesis {
    pub id: Uuid,
    pub session_id: Uuid,
    pub statement: String,
    pub status: String,
    pub similarity: f64,
    pub importance: f64,
    pub age_days: f64,
}

impl RetrievedHypothesis {
    /// Retention bonus for hypotheses: 1.0 when the experiment's last
    /// retain/defer/archive decision was `retained`.
    pub fn retention_bonus(&self) -> f64 {
        if self.status.eq_ignore_ascii_case("retained") {
            1.0
        } else {
            0.0
        }
    }
}

/// One row recording that a rehydration pass ran against a session, kept for
/// audit and for the cross-session preference tie-break.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RehydrationRunRecord {
    pub session_id: Uuid,
    pub query: String,
    pub candidate_count: usize,
    pub selected_ids: Vec<Uuid>,
    pub ran_at: DateTime<Utc>,
}

/// What the external store is able to do right now. Every field defaults to
/// `false` in a freshly-probed, unconfigured environment: the system runs
/// fully in-memory rather than refusing to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CapabilitiesSnapshot {
    pub configured: bool,
    pub tables: bool,
    pub rpc: bool,
    pub lifecycle_ready: bool,
    pub rehydration_ready: bool,
}

/// Fields that may be patched on a hypothesis experiment. `None` leaves the
/// existing value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentPatch {
    pub state: Option<String>,
    pub confidence: Option<f64>,
    pub evidence_for: Option<Vec<String>>,
    pub evidence_against: Option<Vec<String>>,
    pub resolution: Option<String>,
}

/// An append-only action recorded against a hypothesis experiment's history
/// (e.g. "compare", "resolve", "abandon").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentAction {
    pub action: String,
    pub detail: Value,
    pub recorded_at: DateTime<Utc>,
}
