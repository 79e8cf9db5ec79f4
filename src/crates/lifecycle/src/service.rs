use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use contracts::{ExperimentAction, ExperimentPatch, PersistenceGateway};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::experiment::HypothesisExperiment;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::state::ExperimentState;

/// What a checkpoint decided about a promoted alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionDecision {
    Retain,
    Defer,
    Archive,
}

impl RetentionDecision {
    fn target_state(self) -> ExperimentState {
        match self {
            RetentionDecision::Retain => ExperimentState::Retained,
            RetentionDecision::Defer => ExperimentState::Deferred,
            RetentionDecision::Archive => ExperimentState::Archived,
        }
    }
}

/// What [`LifecycleService::compare`] did, which tells the caller whether it
/// needs to spawn a background rerun or can use an already-ready result.
#[derive(Debug, Clone)]
pub enum CompareOutcome {
    /// A comparison result already existed; no new work was started.
    ComparisonReady(Value),
    /// A background rerun was (logically) started; the caller owns spawning
    /// it and must call [`LifecycleService::complete_compare`] when it
    /// finishes.
    CompareStarted,
    /// The experiment is already mid-rerun from a prior `trigger-rerun` call.
    AlreadyRerunning,
    /// Another compare request for this experiment is already in flight.
    Inflight,
    /// No experiment exists with that id.
    NotFound,
}

struct Store {
    experiments: HashMap<Uuid, HypothesisExperiment>,
    by_session: HashMap<Uuid, Vec<Uuid>>,
}

/// Authoritative in-memory store of hypothesis experiments, mirrored
/// best-effort to an external gateway. The in-memory map is always correct;
/// gateway failures only ever flip [`Self::degraded`] and get logged.
pub struct LifecycleService {
    store: Mutex<Store>,
    inflight: Mutex<HashSet<Uuid>>,
    gateway: Arc<dyn PersistenceGateway>,
    degraded: AtomicBool,
    metrics: Metrics,
}

impl LifecycleService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            store: Mutex::new(Store {
                experiments: HashMap::new(),
                by_session: HashMap::new(),
            }),
            inflight: Mutex::new(HashSet::new()),
            gateway,
            degraded: AtomicBool::new(false),
            metrics: Metrics::default(),
        }
    }

    /// Sticky once flipped: the external mirror doesn't un-degrade itself
    /// mid-session without an explicit capability re-probe.
    pub fn degraded_mode(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn mark_degraded(&self, context: &str, err: &contracts::PersistenceError) {
        self.degraded.store(true, Ordering::Relaxed);
        tracing::debug!(%context, %err, "lifecycle gateway call failed, continuing in-memory only");
    }

    /// Creates a `promoted` experiment from a checkpoint that disagreed with
    /// (or wants to explore an alternative to) a conclusion.
    pub async fn create_experiment(
        &self,
        session_id: Uuid,
        target_node_id: Uuid,
        alternative_summary: impl Into<String>,
    ) -> HypothesisExperiment {
        let experiment = HypothesisExperiment::promote(session_id, target_node_id, alternative_summary);
        {
            let mut store = self.store.lock().await;
            store.by_session.entry(session_id).or_default().push(experiment.id);
            store.experiments.insert(experiment.id, experiment.clone());
        }

        if let Err(err) = self
            .gateway
            .create_hypothesis_experiment(session_id, &experiment.alternative_summary)
            .await
        {
            self.mark_degraded("create_hypothesis_experiment", &err);
        }

        experiment
    }

    /// Links a checkpoint's verdict and optional correction to the
    /// experiment and moves it from `promoted` to `checkpointed`.
    pub async fn record_checkpoint_action(
        &self,
        experiment_id: Uuid,
        verdict: impl Into<String>,
        correction: Option<String>,
    ) -> Option<HypothesisExperiment> {
        let verdict = verdict.into();
        let updated = self
            .mutate(experiment_id, |experiment| {
                experiment.verdict = Some(verdict.clone());
                experiment.correction = correction.clone();
            })
            .await?;
        let transitioned = self.transition(experiment_id, ExperimentState::Checkpointed).await?;

        let action = ExperimentAction {
            action: "checkpoint".into(),
            detail: serde_json::json!({ "verdict": transitioned.verdict, "correction": transitioned.correction }),
            recorded_at: Utc::now(),
        };
        if let Err(err) = self.gateway.create_hypothesis_experiment_action(experiment_id, action).await {
            self.mark_degraded("create_hypothesis_experiment_action", &err);
        }

        let _ = updated;
        Some(transitioned)
    }

    /// Moves the experiment to `rerunning` and records the id of the
    /// background rerun the caller is about to spawn. The caller is
    /// responsible for actually enqueuing that task and publishing
    /// `hypothesis-experiment-updated`.
    pub async fn trigger_rerun(&self, experiment_id: Uuid, rerun_run_id: impl Into<String>) -> Option<HypothesisExperiment> {
        let rerun_run_id = rerun_run_id.into();
        self.mutate(experiment_id, |experiment| {
            experiment.rerun_run_id = Some(rerun_run_id.clone());
        })
        .await?;
        let transitioned = self.transition(experiment_id, ExperimentState::Rerunning).await?;
        if let Err(err) = self
            .gateway
            .update_hypothesis_experiment(
                experiment_id,
                ExperimentPatch { state: Some("rerunning".into()), ..Default::default() },
            )
            .await
        {
            self.mark_degraded("update_hypothesis_experiment", &err);
        }
        Some(transitioned)
    }

    /// Implements the compare guard described in
    /// [`CompareOutcome`]: every call increments `compare_requests`
    /// regardless of outcome.
    pub async fn compare(&self, experiment_id: Uuid, force: bool) -> CompareOutcome {
        self.metrics.record_compare_request();

        let existing = {
            let store = self.store.lock().await;
            match store.experiments.get(&experiment_id) {
                Some(experiment) => experiment.clone(),
                None => return CompareOutcome::NotFound,
            }
        };

        if let (Some(result), false) = (&existing.comparison_result, force) {
            self.transition(experiment_id, ExperimentState::Comparing).await;
            return CompareOutcome::ComparisonReady(result.clone());
        }

        if existing.state == ExperimentState::Rerunning {
            return CompareOutcome::AlreadyRerunning;
        }

        let mut inflight = self.inflight.lock().await;
        if !inflight.insert(experiment_id) {
            return CompareOutcome::Inflight;
        }
        drop(inflight);

        self.transition(experiment_id, ExperimentState::Comparing).await;
        CompareOutcome::CompareStarted
    }

    /// Releases the in-flight marker [`Self::compare`] set without a
    /// background rerun actually being dispatched (the caller lacked a
    /// `node_id`/`correction` to rerun with, or declined to rerun at all).
    /// Without this, `compare` on this experiment would report `Inflight`
    /// forever.
    pub async fn cancel_inflight(&self, experiment_id: Uuid) {
        self.inflight.lock().await.remove(&experiment_id);
    }

    /// Called when the background rerun kicked off by [`Self::trigger_rerun`]
    /// finishes: records the comparison result and moves the experiment from
    /// `rerunning` to `comparing`. Distinct from [`Self::complete_compare`],
    /// which finishes a rerun started by [`Self::compare`] itself and doesn't
    /// touch the `rerunning` state at all.
    pub async fn complete_rerun(&self, experiment_id: Uuid, comparison_result: Value) -> Option<HypothesisExperiment> {
        self.mutate(experiment_id, |experiment| {
            experiment.comparison_result = Some(comparison_result.clone());
        })
        .await?;
        self.transition(experiment_id, ExperimentState::Comparing).await
    }

    /// Called by the background task `compare` logically started: records
    /// the result, clears the in-flight marker, and increments
    /// `compare_completed`.
    pub async fn complete_compare(&self, experiment_id: Uuid, result: Value) -> Option<HypothesisExperiment> {
        let updated = self
            .mutate(experiment_id, |experiment| {
                experiment.comparison_result = Some(result.clone());
            })
            .await?;
        self.inflight.lock().await.remove(&experiment_id);
        self.metrics.record_compare_completed();
        Some(updated)
    }

    /// Records the final retain/defer/archive decision.
    pub async fn retain(&self, experiment_id: Uuid, decision: RetentionDecision) -> Option<HypothesisExperiment> {
        self.mutate(experiment_id, |experiment| {
            experiment.retention_decision = Some(decision);
            if decision == RetentionDecision::Retain {
                experiment.preferred_run_id = experiment.rerun_run_id.clone();
            }
        })
        .await?;
        let transitioned = self.transition(experiment_id, decision.target_state()).await?;
        match decision {
            RetentionDecision::Retain => self.metrics.record_retained(),
            RetentionDecision::Defer => self.metrics.record_deferred(),
            RetentionDecision::Archive => self.metrics.record_archived(),
        }

        if let Err(err) = self
            .gateway
            .update_hypothesis_experiment(
                experiment_id,
                ExperimentPatch { state: Some(format!("{:?}", transitioned.state).to_lowercase()), ..Default::default() },
            )
            .await
        {
            self.mark_degraded("update_hypothesis_experiment", &err);
        }
        Some(transitioned)
    }

    pub async fn get(&self, experiment_id: Uuid) -> Option<HypothesisExperiment> {
        self.store.lock().await.experiments.get(&experiment_id).cloned()
    }

    pub async fn list_for_session(&self, session_id: Uuid, status: Option<ExperimentState>, limit: usize) -> Vec<HypothesisExperiment> {
        let store = self.store.lock().await;
        let Some(ids) = store.by_session.get(&session_id) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| store.experiments.get(id))
            .filter(|experiment| status.map(|s| s == experiment.state).unwrap_or(true))
            .take(limit)
            .cloned()
            .collect()
    }

    async fn mutate(&self, experiment_id: Uuid, f: impl FnOnce(&mut HypothesisExperiment)) -> Option<HypothesisExperiment> {
        let mut store = self.store.lock().await;
        let experiment = store.experiments.get_mut(&experiment_id)?;
        f(experiment);
        experiment.updated_at = Utc::now();
        Some(experiment.clone())
    }

    /// Applies a state transition if allowed; otherwise logs a warning and
    /// leaves the experiment untouched (silent coercion to a no-op).
    async fn transition(&self, experiment_id: Uuid, next: ExperimentState) -> Option<HypothesisExperiment> {
        let mut store = self.store.lock().await;
        let experiment = store.experiments.get_mut(&experiment_id)?;
        if !experiment.state.can_transition_to(next) {
            tracing::warn!(
                experiment_id = %experiment_id,
                from = ?experiment.state,
                to = ?next,
                "disallowed lifecycle transition coerced to no-op"
            );
            return Some(experiment.clone());
        }
        experiment.state = next;
        experiment.updated_at = Utc::now();
        Some(experiment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::NullGateway;

    fn service() -> LifecycleService {
        LifecycleService::new(Arc::new(NullGateway))
    }

    #[tokio::test]
    async fn create_experiment_starts_promoted_and_marks_degraded_against_a_null_gateway() {
        let service = service();
        let session_id = Uuid::new_v4();
        let experiment = service.create_experiment(session_id, Uuid::new_v4(), "alt").await;
        assert_eq!(experiment.state, ExperimentState::Promoted);
        assert!(service.degraded_mode());
    }

    #[tokio::test]
    async fn checkpoint_then_rerun_then_compare_then_retain_follows_the_happy_path() {
        let service = service();
        let session_id = Uuid::new_v4();
        let experiment = service.create_experiment(session_id, Uuid::new_v4(), "alt").await;

        let checkpointed = service
            .record_checkpoint_action(experiment.id, "disagree", Some("use caching".into()))
            .await
            .unwrap();
        assert_eq!(checkpointed.state, ExperimentState::Checkpointed);

        let rerunning = service.trigger_rerun(experiment.id, "run-1").await.unwrap();
        assert_eq!(rerunning.state, ExperimentState::Rerunning);

        // While rerunning, compare reports already_rerunning rather than
        // racing a second background task.
        match service.compare(experiment.id, false).await {
            CompareOutcome::AlreadyRerunning => {}
            other => panic!("expected AlreadyRerunning, got {other:?}"),
        }

        // The background rerun triggered by trigger_rerun finishes and moves
        // the experiment into comparing.
        service.complete_rerun(experiment.id, serde_json::json!({"winner": "b"})).await;
        let retained = service.retain(experiment.id, RetentionDecision::Retain).await.unwrap();
        assert_eq!(retained.state, ExperimentState::Retained);

        let metrics = service.metrics();
        assert_eq!(metrics.retained, 1);
        assert_eq!(retained.retention_decision, Some(RetentionDecision::Retain));
        assert_eq!(retained.preferred_run_id.as_deref(), Some("run-1"));
    }

    #[tokio::test]
    async fn compare_with_an_existing_result_and_no_force_fast_paths() {
        let service = service();
        let experiment = service.create_experiment(Uuid::new_v4(), Uuid::new_v4(), "alt").await;
        service.record_checkpoint_action(experiment.id, "disagree", None).await;
        service.trigger_rerun(experiment.id, "run-1").await;
        service.complete_rerun(experiment.id, serde_json::json!({"winner": "a"})).await;

        match service.compare(experiment.id, false).await {
            CompareOutcome::ComparisonReady(result) => assert_eq!(result, serde_json::json!({"winner": "a"})),
            other => panic!("expected ComparisonReady, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_compare_requests_only_start_one_background_task() {
        let service = service();
        let session_id = Uuid::new_v4();
        let experiment = service.create_experiment(session_id, Uuid::new_v4(), "alt").await;
        service.record_checkpoint_action(experiment.id, "explore", None).await;
        service.trigger_rerun(experiment.id, "run-1").await;
        service.complete_rerun(experiment.id, serde_json::json!({"winner": "a"})).await;
        // comparison_result now set; a force compare bypasses the fast path
        // and exercises the in-flight guard.
        let first = service.compare(experiment.id, true).await;
        let second = service.compare(experiment.id, true).await;
        assert!(matches!(first, CompareOutcome::CompareStarted));
        assert!(matches!(second, CompareOutcome::Inflight));
    }

    #[tokio::test]
    async fn retain_is_a_terminal_state_archived_is_the_only_further_move() {
        let service = service();
        let experiment = service.create_experiment(Uuid::new_v4(), Uuid::new_v4(), "alt").await;
        service.record_checkpoint_action(experiment.id, "disagree", None).await;
        service.trigger_rerun(experiment.id, "run-1").await;
        service.complete_rerun(experiment.id, serde_json::json!({})).await;
        service.retain(experiment.id, RetentionDecision::Defer).await;

        let bounced = service.retain(experiment.id, RetentionDecision::Retain).await.unwrap();
        assert_eq!(bounced.state, ExperimentState::Deferred, "disallowed transition must be a no-op");

        let archived = service.retain(experiment.id, RetentionDecision::Archive).await.unwrap();
        assert_eq!(archived.state, ExperimentState::Archived);
    }
}
