use std::collections::HashMap;

use uuid::Uuid;

use crate::candidate::Candidate;
use crate::dedup::dedup_key;

pub const MAX_CANDIDATES: usize = 4;
pub const EXCERPT_CHARS: usize = 420;

/// Deduplicates, ranks, and applies the cross-session preference to a batch of
/// already-scored candidates, returning at most [`MAX_CANDIDATES`] winners.
///
/// Applies the cross-session preference literally: if the deduplicated set
/// contains at least one candidate whose source session differs from
/// `current_session_id`, every
/// same-session candidate is dropped outright before truncating to the top
/// four — same-session context is already live in the graph and doesn't need
/// to be re-injected into the prompt.
pub fn select(current_session_id: Uuid, candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut by_key: HashMap<(Uuid, String), Candidate> = HashMap::new();
    for candidate in candidates {
        let key = dedup_key(candidate.source_session_id, &candidate.text);
        by_key
            .entry(key)
            .and_modify(|existing| {
                if candidate.score > existing.score {
                    *existing = candidate.clone();
                }
            })
            .or_insert(candidate);
    }

    let mut ranked: Vec<Candidate> = by_key.into_values().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let has_cross_session = ranked.iter().any(|c| c.source_session_id != current_session_id);
    if has_cross_session {
        ranked.retain(|c| c.source_session_id != current_session_id);
    }

    ranked.truncate(MAX_CANDIDATES);
    ranked
}

/// Trims a candidate's text to a short excerpt suitable for a preamble,
/// breaking on a char boundary and marking truncation with an ellipsis.
pub fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{truncated}…")
}
