const SIMILARITY_WEIGHT: f64 = 0.60;
const IMPORTANCE_WEIGHT: f64 = 0.25;
const RECENCY_WEIGHT: f64 = 0.10;
const RETENTION_WEIGHT: f64 = 0.05;
const RECENCY_HORIZON_DAYS: f64 = 30.0;

/// `max(0, 1 - age_days / 30)`: a candidate created today scores 1.0, one 30
/// days old or older scores 0.0.
pub fn recency(age_days: f64) -> f64 {
    (1.0 - age_days / RECENCY_HORIZON_DAYS).max(0.0)
}

/// Weighted blend of similarity, importance, recency, and a small retention
/// bonus that nudges previously-retained context back in on ties.
///
/// A pure function of its four inputs: given the same
/// `(similarity, importance, recency, retention_bonus)` it always returns the
/// same score, so the ranking of a candidate set never depends on anything
/// outside those four numbers.
pub fn score(similarity: f64, importance: f64, recency: f64, retention_bonus: f64) -> f64 {
    SIMILARITY_WEIGHT * similarity
        + IMPORTANCE_WEIGHT * importance
        + RECENCY_WEIGHT * recency
        + RETENTION_WEIGHT * retention_bonus
}
