//! `POST /api/swarm/{session_id}/checkpoint` — records a human verdict
//! against one reasoning node. A `disagree` verdict with a correction
//! promotes (or reuses) a hypothesis experiment and kicks off a scoped
//! background re-run of just the analyst and contrarian.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use event_bus::SwarmEvent;
use reasoning_graph::{AgentRole, EdgeRelation, NodeKind, ReasoningEdge, ReasoningNode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::check_bearer;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const VALID_VERDICTS: [&str; 6] = ["verified", "questionable", "disagree", "agree", "explore", "note"];

#[derive(Deserialize)]
pub struct CheckpointRequest {
    pub node_id: Uuid,
    pub verdict: String,
    #[serde(default)]
    pub correction: Option<String>,
    #[serde(default)]
    pub alternative_summary: Option<String>,
    #[serde(default)]
    pub experiment_id: Option<Uuid>,
    #[serde(default)]
    pub performed_by: Option<String>,
}

#[derive(Serialize)]
struct CheckpointResponse {
    status: &'static str,
    annotation_node_id: Uuid,
    experiment_id: Option<Uuid>,
}

pub async fn record_checkpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
    Json(req): Json<CheckpointRequest>,
) -> ApiResult<impl IntoResponse> {
    check_bearer(&headers, &state.config.auth_secret)?;

    if !VALID_VERDICTS.contains(&req.verdict.as_str()) {
        return Err(ApiError::ValidationError(format!("verdict must be one of {VALID_VERDICTS:?}")));
    }

    let target = state
        .graph
        .get_node(req.node_id)
        .ok_or_else(|| ApiError::NotFound(format!("no node {} in session {session_id}", req.node_id)))?;

    let mut content = format!("human verdict: {}", req.verdict);
    if let Some(correction) = &req.correction {
        content.push_str(&format!(" — correction: {correction}"));
    }
    let annotation = ReasoningNode::new(session_id, AgentRole::HumanAnnotation, content, 1.0).with_kind(NodeKind::HumanAnnotation);
    let annotation_id = state.graph.add_node(annotation.clone());
    let edge = ReasoningEdge::new(annotation_id, target.id, EdgeRelation::Observes, 1.0);
    let _ = state.graph.add_edge(edge.clone());

    let gateway = state.gateway.clone();
    tokio::spawn(async move {
        if let Err(err) = gateway.sync_node(&annotation).await {
            tracing::debug!(%err, "checkpoint annotation mirror write failed");
        }
        if let Err(err) = gateway.sync_edge(&edge).await {
            tracing::debug!(%err, "checkpoint edge mirror write failed");
        }
    });

    state.bus.publish(
        session_id,
        SwarmEvent::HumanCheckpoint {
            session_id,
            timestamp: chrono::Utc::now(),
            node_id: target.id,
            verdict: req.verdict.clone(),
            correction: req.correction.clone(),
        },
    );

    // §4.4: an experiment is promoted from any checkpoint that supplies an
    // alternative — `disagree` (with a correction) or `explore` (with just a
    // summary) — but only `disagree` kicks off a scoped re-run.
    let mut experiment_id = req.experiment_id;
    if (req.verdict == "disagree" || req.verdict == "explore")
        && (req.correction.is_some() || req.alternative_summary.is_some())
    {
        let existing = match experiment_id {
            Some(id) => state.lifecycle.get(id).await,
            None => None,
        };
        let experiment = match existing {
            Some(experiment) => experiment,
            None => {
                let summary = req
                    .alternative_summary
                    .clone()
                    .or_else(|| req.correction.clone())
                    .expect("checked above");
                state.lifecycle.create_experiment(session_id, target.id, summary).await
            }
        };
        experiment_id = Some(experiment.id);
        state.lifecycle.record_checkpoint_action(experiment.id, req.verdict.clone(), req.correction.clone()).await;

        if req.verdict == "disagree" {
            if let Some(correction) = req.correction.clone() {
                let rerun_run_id = Uuid::new_v4();
                state.lifecycle.trigger_rerun(experiment.id, rerun_run_id.to_string()).await;

                let coordinator = state.coordinator.clone();
                let lifecycle = state.lifecycle.clone();
                let bus = state.bus.clone();
                let target_node_id = target.id;
                let experiment_id = experiment.id;
                tokio::spawn(async move {
                    let outcome = coordinator.rerun_with_correction(session_id, target_node_id, &correction).await;
                    let result = serde_json::json!({
                        "rerun_run_id": rerun_run_id,
                        "agents": outcome.as_ref().map(|o| o.agents.len()).unwrap_or(0),
                        "tokens_used": outcome.as_ref().map(|o| o.tokens_used).unwrap_or(0),
                    });
                    if let Some(updated) = lifecycle.complete_rerun(experiment_id, result).await {
                        bus.publish(
                            session_id,
                            SwarmEvent::HypothesisExperimentUpdated {
                                session_id,
                                timestamp: chrono::Utc::now(),
                                experiment_id,
                                state: format!("{:?}", updated.state).to_lowercase(),
                            },
                        );
                    }
                });
            }
        }
    }

    Ok(crate::response::accepted(CheckpointResponse { status: "recorded", annotation_node_id: annotation_id, experiment_id }))
}
