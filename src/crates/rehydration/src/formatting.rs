use crate::candidate::Candidate;
use crate::selection::excerpt;

/// A short instruction appended after the preamble, telling the planner how
/// much weight to give retrieved context relative to the live query.
pub const TREATMENT_INSTRUCTION: &str = "Treat the prior reasoning above as background, not as settled fact: \
weigh it against the current query and say so explicitly if it turns out to be stale or contradicted.";

/// Renders ranked candidates into the preamble text prepended to the Phase 0
/// planning prompt. An empty candidate list renders to an empty string: no
/// prior-context section is shown when rehydration found nothing relevant.
pub fn render_preamble(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return String::new();
    }

    let mut out = String::from("Relevant prior reasoning:\n");
    for (index, candidate) in candidates.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}, session {}] score={:.3} (similarity={:.2}, importance={:.2}, recency={:.2}, retention={:.2}): {}\n",
            index + 1,
            candidate.source.as_str(),
            candidate.source_session_id,
            candidate.score,
            candidate.similarity,
            candidate.importance,
            candidate.recency,
            candidate.retention_bonus,
            excerpt(&candidate.text),
        ));
    }
    out
}

/// Builds the query actually sent into Phase 0: the original query, followed
/// by the rendered preamble and the treatment instruction, when there is one.
pub fn augment_query(original_query: &str, preamble: &str) -> String {
    if preamble.is_empty() {
        return original_query.to_string();
    }
    format!("{original_query}\n\n{preamble}\n\n{TREATMENT_INSTRUCTION}")
}
