use md5::{Digest, Md5};
use uuid::Uuid;

/// Identifies near-duplicate candidates: the same session having produced the
/// same text twice (once verbatim, once paraphrased by a different search
/// path into the store) collapses to a single candidate.
///
/// Hashes lowercased, trimmed text with md5 — not a security-relevant use of
/// the hash, just a cheap content fingerprint for dedup keys.
pub fn dedup_key(source_session_id: Uuid, text: &str) -> (Uuid, String) {
    let mut hasher = Md5::new();
    hasher.update(text.trim().to_lowercase().as_bytes());
    let digest = hasher.finalize();
    (source_session_id, format!("{digest:x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_in_the_same_session_collapses_to_one_key() {
        let session = Uuid::new_v4();
        let a = dedup_key(session, "The swarm converged on a single root cause.");
        let b = dedup_key(session, "  THE swarm converged on a single root cause.  ");
        assert_eq!(a, b);
    }

    #[test]
    fn same_text_in_different_sessions_is_not_deduplicated() {
        let a = dedup_key(Uuid::new_v4(), "identical text");
        let b = dedup_key(Uuid::new_v4(), "identical text");
        assert_ne!(a, b);
    }
}
