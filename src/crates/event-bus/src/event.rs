use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The closed set of events that flow across a session's WebSocket connection.
///
/// Every variant carries `session_id` and `timestamp`; the `event` tag and field
/// names match the wire schema consumed by the presentation client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SwarmEvent {
    SwarmStarted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    AgentStarted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        agent: String,
        effort: String,
    },
    AgentThinking {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        agent: String,
        delta: String,
    },
    GraphNodeCreated {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        node_id: Uuid,
        agent: String,
    },
    AgentChallenges {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        agent: String,
        target_node_id: Uuid,
    },
    VerificationScore {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        agent: String,
        target_node_id: Uuid,
        score: f64,
    },
    AgentCompleted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        agent: String,
        conclusion_preview: String,
        confidence: f64,
        tokens_used: u64,
    },
    SynthesisReady {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        node_id: Uuid,
    },
    MetaInsight {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        insight_type: String,
        description: String,
        affected_agents: Vec<String>,
    },
    MaestroDecomposition {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        agents: Vec<String>,
        subtasks: Vec<String>,
    },
    HumanCheckpoint {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        node_id: Uuid,
        verdict: String,
        correction: Option<String>,
    },
    SwarmRerunStarted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        target_node_id: Uuid,
    },
    HypothesisExperimentUpdated {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        experiment_id: Uuid,
        state: String,
    },
    SwarmError {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        error: String,
    },
    Ping {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// Escape hatch for lifecycle/checkpoint code paths that need to publish
    /// a loosely-structured payload. Keeps the bus's public API a single
    /// closed enum instead of accepting arbitrary values.
    Extension {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        payload: Value,
    },
}

impl SwarmEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            SwarmEvent::SwarmStarted { session_id, .. }
            | SwarmEvent::AgentStarted { session_id, .. }
            | SwarmEvent::AgentThinking { session_id, .. }
            | SwarmEvent::GraphNodeCreated { session_id, .. }
            | SwarmEvent::AgentChallenges { session_id, .. }
            | SwarmEvent::VerificationScore { session_id, .. }
            | SwarmEvent::AgentCompleted { session_id, .. }
            | SwarmEvent::SynthesisReady { session_id, .. }
            | SwarmEvent::MetaInsight { session_id, .. }
            | SwarmEvent::MaestroDecomposition { session_id, .. }
            | SwarmEvent::HumanCheckpoint { session_id, .. }
            | SwarmEvent::SwarmRerunStarted { session_id, .. }
            | SwarmEvent::HypothesisExperimentUpdated { session_id, .. }
            | SwarmEvent::SwarmError { session_id, .. }
            | SwarmEvent::Ping { session_id, .. }
            | SwarmEvent::Extension { session_id, .. } => *session_id,
        }
    }

    pub fn ping(session_id: Uuid) -> Self {
        SwarmEvent::Ping {
            session_id,
            timestamp: Utc::now(),
        }
    }

    pub fn error(session_id: Uuid, error: impl Into<String>) -> Self {
        SwarmEvent::SwarmError {
            session_id,
            timestamp: Utc::now(),
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() {
        let event = SwarmEvent::ping(Uuid::nil());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ping");
        assert_eq!(json["session_id"], Uuid::nil().to_string());
    }

    #[test]
    fn session_id_accessor_covers_every_variant() {
        let sid = Uuid::new_v4();
        let events = vec![
            SwarmEvent::SwarmStarted { session_id: sid, timestamp: Utc::now() },
            SwarmEvent::error(sid, "boom"),
            SwarmEvent::Extension { session_id: sid, timestamp: Utc::now(), payload: Value::Null },
        ];
        for event in events {
            assert_eq!(event.session_id(), sid);
        }
    }
}
