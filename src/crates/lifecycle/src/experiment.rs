use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use uuid::Uuid;

use crate::service::RetentionDecision;
use crate::state::ExperimentState;

/// A checkpoint-originated alternative hypothesis, tracked from the moment a
/// human disagrees with a conclusion through to a retain/defer/archive
/// decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisExperiment {
    pub id: Uuid,
    pub session_id: Uuid,
    pub target_node_id: Uuid,
    pub alternative_summary: String,
    pub state: ExperimentState,
    pub verdict: Option<String>,
    pub correction: Option<String>,
    pub comparison_result: Option<serde_json::Value>,
    /// Set by [`crate::service::LifecycleService::retain`]; mirrors `state`
    /// for the three terminal states but survives independently of it so a
    /// caller can tell "retained, then later archived" from "archived
    /// directly" without reading the event log.
    pub retention_decision: Option<RetentionDecision>,
    /// Run id of the conclusion currently preferred over the alternative.
    /// Set when a rerun is retained in place of (or alongside) the original.
    pub preferred_run_id: Option<String>,
    /// Run id of the background correction rerun started by
    /// [`crate::service::LifecycleService::trigger_rerun`].
    pub rerun_run_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HypothesisExperiment {
    pub fn promote(session_id: Uuid, target_node_id: Uuid, alternative_summary: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id,
            target_node_id,
            alternative_summary: alternative_summary.into(),
            state: ExperimentState::Promoted,
            verdict: None,
            correction: None,
            comparison_result: None,
            retention_decision: None,
            preferred_run_id: None,
            rerun_run_id: None,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}
