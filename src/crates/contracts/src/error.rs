use thiserror::Error;

/// The three ways a persistence gateway call can fail, matching the retry
/// discipline: transient errors are retried with backoff, permanent errors
/// surface immediately, and capability-absent errors mean the backing table or
/// RPC simply isn't configured (not a failure of the call itself).
#[derive(Debug, Error, Clone)]
pub enum PersistenceError {
    #[error("transient persistence error: {0}")]
    Transient(String),
    #[error("permanent persistence error: {0}")]
    Permanent(String),
    #[error("capability not available: {0}")]
    CapabilityAbsent(String),
}

impl PersistenceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PersistenceError::Transient(_))
    }

    pub fn is_capability_absent(&self) -> bool {
        matches!(self, PersistenceError::CapabilityAbsent(_))
    }
}
