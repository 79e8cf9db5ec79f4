use uuid::Uuid;

/// Which store a rehydration candidate was retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Artifact,
    Hypothesis,
}

impl CandidateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateSource::Artifact => "artifact",
            CandidateSource::Hypothesis => "hypothesis",
        }
    }
}

/// A scored, ephemeral rehydration candidate. Never persisted in the
/// reasoning graph: it exists only long enough to be ranked and folded into a
/// preamble for one query.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub source: CandidateSource,
    pub source_session_id: Uuid,
    pub text: String,
    pub similarity: f64,
    pub importance: f64,
    pub recency: f64,
    pub retention_bonus: f64,
    pub score: f64,
}
