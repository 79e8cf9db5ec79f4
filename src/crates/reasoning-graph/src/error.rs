use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Adding this edge would introduce a cycle: a path already exists from
    /// `target` back to `source`.
    #[error("cycle detected: adding edge would create a path back from {target} to {source}")]
    CycleDetected { source: Uuid, target: Uuid },
}
