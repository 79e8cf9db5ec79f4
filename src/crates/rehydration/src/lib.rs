//! Pre-run retrieval: before a swarm starts reasoning about a query, pull in
//! whatever past artifacts and hypotheses look relevant and fold a short
//! preamble of them into the Phase 0 planning prompt.

mod candidate;
mod dedup;
mod formatting;
mod metrics;
mod scoring;
mod selection;

pub use candidate::{Candidate, CandidateSource};
pub use formatting::{augment_query, render_preamble, TREATMENT_INSTRUCTION};
pub use metrics::{RehydrationMetrics, RehydrationMetricsSnapshot};
pub use scoring::{recency, score};
pub use selection::{excerpt, select, EXCERPT_CHARS, MAX_CANDIDATES};

use chrono::Utc;
use contracts::{PersistenceGateway, RehydrationRunRecord};
use uuid::Uuid;

/// Above this cosine similarity a search hit is worth considering at all.
const SIMILARITY_THRESHOLD: f64 = 0.68;
/// Fetched independently for artifacts and for hypotheses; the combined pool
/// is then scored, deduplicated, and cut down to [`MAX_CANDIDATES`].
const SEARCH_LIMIT: usize = 12;

/// The outcome of one rehydration pass: the query to actually send into
/// Phase 0, and the candidates that were folded into it (for logging and for
/// the audit trail the caller may want beyond what this crate writes itself).
#[derive(Debug, Clone)]
pub struct RehydrationOutcome {
    pub augmented_query: String,
    pub selected: Vec<Candidate>,
}

impl RehydrationOutcome {
    fn passthrough(original_query: &str) -> Self {
        Self {
            augmented_query: original_query.to_string(),
            selected: Vec::new(),
        }
    }
}

/// Runs the full rehydration pass for a new query: embeds it, searches the
/// store for both prior artifacts and prior hypotheses in parallel, ranks and
/// deduplicates the combined pool, and records the run for audit.
///
/// Returns the original query unchanged (not an error) when the gateway has
/// no embedding capability configured, or when both searches come back empty
/// or fail transiently: a swarm run with no prior context is a degraded run,
/// not a failed one.
pub async fn rehydrate(
    gateway: &dyn PersistenceGateway,
    metrics: &RehydrationMetrics,
    session_id: Uuid,
    query: &str,
) -> RehydrationOutcome {
    let embedding = match gateway.generate_reasoning_embedding(query).await {
        Ok(embedding) => embedding,
        Err(err) => {
            tracing::debug!(?err, "rehydration skipped: embeddings unavailable");
            return RehydrationOutcome::passthrough(query);
        }
    };

    let (artifacts, hypotheses) = tokio::join!(
        gateway.search_reasoning_artifacts(&embedding, SIMILARITY_THRESHOLD, SEARCH_LIMIT, None),
        gateway.search_structured_reasoning_hypotheses_semantic(&embedding, SIMILARITY_THRESHOLD, SEARCH_LIMIT, None, None),
    );

    let mut candidates = Vec::new();

    match artifacts {
        Ok(artifacts) => candidates.extend(artifacts.into_iter().map(|artifact| candidate::Candidate {
            id: artifact.id,
            source: CandidateSource::Artifact,
            source_session_id: artifact.session_id,
            recency: recency(artifact.age_days),
            score: score(artifact.similarity, artifact.importance, recency(artifact.age_days), artifact.retention_bonus()),
            retention_bonus: artifact.retention_bonus(),
            similarity: artifact.similarity,
            importance: artifact.importance,
            text: artifact.text,
        })),
        Err(err) => tracing::debug!(?err, "rehydration: artifact search failed"),
    }

    match hypotheses {
        Ok(hypotheses) => candidates.extend(hypotheses.into_iter().map(|hypothesis| candidate::Candidate {
            id: hypothesis.id,
            source: CandidateSource::Hypothesis,
            source_session_id: hypothesis.session_id,
            recency: recency(hypothesis.age_days),
            score: score(
                hypothesis.similarity,
                hypothesis.importance,
                recency(hypothesis.age_days),
                hypothesis.retention_bonus(),
            ),
            retention_bonus: hypothesis.retention_bonus(),
            similarity: hypothesis.similarity,
            importance: hypothesis.importance,
            text: hypothesis.statement,
        })),
        Err(err) => tracing::debug!(?err, "rehydration: hypothesis search failed"),
    }

    if candidates.is_empty() {
        metrics.record_run(0);
        return RehydrationOutcome::passthrough(query);
    }

    let selected = select(session_id, candidates);
    metrics.record_run(selected.len());

    for candidate in selected.iter().filter(|c| c.source == CandidateSource::Artifact) {
        if let Err(err) = gateway.mark_reasoning_artifact_used(candidate.id).await {
            tracing::debug!(?err, id = %candidate.id, "could not mark rehydrated artifact as used");
        }
    }

    let run = RehydrationRunRecord {
        session_id,
        query: query.to_string(),
        candidate_count: selected.len(),
        selected_ids: selected.iter().map(|c| c.id).collect(),
        ran_at: Utc::now(),
    };
    if let Err(err) = gateway.create_session_rehydration_run(run).await {
        tracing::debug!(?err, "rehydration run record not persisted");
    }

    let preamble = render_preamble(&selected);
    RehydrationOutcome {
        augmented_query: augment_query(query, &preamble),
        selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::NullGateway;

    #[tokio::test]
    async fn rehydration_against_a_capability_absent_gateway_passes_the_query_through_unchanged() {
        let gateway = NullGateway;
        let metrics = RehydrationMetrics::default();
        let outcome = rehydrate(&gateway, &metrics, Uuid::new_v4(), "what caused the regression?").await;
        assert_eq!(outcome.augmented_query, "what caused the regression?");
        assert!(outcome.selected.is_empty());
        assert_eq!(metrics.snapshot().runs, 0);
    }
}
