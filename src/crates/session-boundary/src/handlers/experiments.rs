//! Hypothesis-experiment endpoints: list, compare, retain.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use event_bus::SwarmEvent;
use lifecycle::{CompareOutcome, ExperimentState, HypothesisExperiment, MetricsSnapshot, RetentionDecision};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::check_bearer;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListExperimentsQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct ListExperimentsResponse {
    experiments: Vec<HypothesisExperiment>,
    lifecycle: LifecycleSummary,
}

#[derive(Serialize)]
struct LifecycleSummary {
    degraded_mode: bool,
    capabilities: contracts::CapabilitiesSnapshot,
    #[serde(flatten)]
    metrics: MetricsSnapshot,
}

fn parse_status(status: &str) -> ApiResult<ExperimentState> {
    match status {
        "promoted" => Ok(ExperimentState::Promoted),
        "checkpointed" => Ok(ExperimentState::Checkpointed),
        "rerunning" => Ok(ExperimentState::Rerunning),
        "comparing" => Ok(ExperimentState::Comparing),
        "retained" => Ok(ExperimentState::Retained),
        "deferred" => Ok(ExperimentState::Deferred),
        "archived" => Ok(ExperimentState::Archived),
        other => Err(ApiError::ValidationError(format!("unknown experiment status: {other}"))),
    }
}

pub async fn list_experiments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
    Query(query): Query<ListExperimentsQuery>,
) -> ApiResult<impl IntoResponse> {
    check_bearer(&headers, &state.config.auth_secret)?;

    let status = query.status.as_deref().map(parse_status).transpose()?;
    let limit = query.limit.unwrap_or(50).min(200);

    let experiments = state.lifecycle.list_for_session(session_id, status, limit).await;
    let metrics = state.lifecycle.metrics();
    Ok(crate::response::ok(ListExperimentsResponse {
        experiments,
        lifecycle: LifecycleSummary {
            degraded_mode: state.lifecycle.degraded_mode(),
            capabilities: state.capabilities.snapshot,
            metrics,
        },
    }))
}

#[derive(Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub performed_by: Option<String>,
    #[serde(default = "default_true")]
    pub rerun_if_missing: bool,
    #[serde(default)]
    pub force_rerun: bool,
    #[serde(default)]
    pub node_id: Option<Uuid>,
    #[serde(default)]
    pub correction: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
struct CompareResponse {
    status: &'static str,
    mode: &'static str,
    comparison_result: Option<serde_json::Value>,
}

pub async fn compare_experiment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(experiment_id): Path<Uuid>,
    Json(req): Json<CompareRequest>,
) -> ApiResult<impl IntoResponse> {
    check_bearer(&headers, &state.config.auth_secret)?;

    match state.lifecycle.compare(experiment_id, req.force_rerun).await {
        CompareOutcome::ComparisonReady(result) => {
            Ok(crate::response::ok(CompareResponse { status: "comparison_ready", mode: "cached", comparison_result: Some(result) }))
        }
        CompareOutcome::CompareStarted => {
            let mut spawned = false;
            if req.rerun_if_missing {
                let session_id = state.lifecycle.get(experiment_id).await.map(|e| e.session_id);
                if let (Some(session_id), Some(node_id), Some(correction)) = (session_id, req.node_id, req.correction.clone()) {
                    let coordinator = state.coordinator.clone();
                    let lifecycle = state.lifecycle.clone();
                    let bus = state.bus.clone();
                    tokio::spawn(async move {
                        let outcome = coordinator.rerun_with_correction(session_id, node_id, &correction).await;
                        let result = serde_json::json!({
                            "agents": outcome.as_ref().map(|o| o.agents.len()).unwrap_or(0),
                        });
                        if let Some(updated) = lifecycle.complete_compare(experiment_id, result).await {
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
                    spawned = true;
                }
            }
            if !spawned {
                state.lifecycle.cancel_inflight(experiment_id).await;
            }
            Ok(crate::response::accepted(CompareResponse { status: "compare_started", mode: "live", comparison_result: None }))
        }
        CompareOutcome::AlreadyRerunning => {
            Ok(crate::response::ok(CompareResponse { status: "already_rerunning", mode: "live", comparison_result: None }))
        }
        CompareOutcome::Inflight => Ok(crate::response::ok(CompareResponse { status: "inflight", mode: "live", comparison_result: None })),
        CompareOutcome::NotFound => Err(ApiError::NotFound(format!("no experiment {experiment_id}"))),
    }
}

#[derive(Deserialize)]
pub struct RetainRequest {
    pub decision: String,
    #[serde(default)]
    pub performed_by: Option<String>,
}

#[derive(Serialize)]
struct RetainResponse {
    status: &'static str,
    experiment: HypothesisExperiment,
}

pub async fn retain_experiment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(experiment_id): Path<Uuid>,
    Json(req): Json<RetainRequest>,
) -> ApiResult<impl IntoResponse> {
    check_bearer(&headers, &state.config.auth_secret)?;

    let decision = match req.decision.as_str() {
        "retain" => RetentionDecision::Retain,
        "defer" => RetentionDecision::Defer,
        "archive" => RetentionDecision::Archive,
        other => return Err(ApiError::ValidationError(format!("decision must be retain, defer, or archive; got {other}"))),
    };

    let experiment = state
        .lifecycle
        .retain(experiment_id, decision)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no experiment {experiment_id}")))?;

    state.bus.publish(
        experiment.session_id,
        SwarmEvent::HypothesisExperimentUpdated {
            session_id: experiment.session_id,
            timestamp: chrono::Utc::now(),
            experiment_id: experiment.id,
            state: format!("{:?}", experiment.state).to_lowercase(),
        },
    );

    Ok(crate::response::ok(RetainResponse { status: "recorded", experiment }))
}
