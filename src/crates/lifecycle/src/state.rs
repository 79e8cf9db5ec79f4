use serde::{Deserialize, Serialize};

/// A hypothesis experiment's position in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperimentState {
    Promoted,
    Checkpointed,
    Rerunning,
    Comparing,
    Retained,
    Deferred,
    Archived,
}

impl ExperimentState {
    /// `true` for the three states a correction rerun finishes in: once here,
    /// only a further move to `archived` (or a no-op self-loop) is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExperimentState::Retained | ExperimentState::Deferred | ExperimentState::Archived)
    }

    fn allowed_next(self) -> &'static [ExperimentState] {
        use ExperimentState::*;
        match self {
            Promoted => &[Checkpointed, Archived],
            Checkpointed => &[Rerunning, Archived],
            Rerunning => &[Comparing, Archived],
            Comparing => &[Retained, Deferred, Archived],
            Retained => &[Retained, Archived],
            Deferred => &[Deferred, Archived],
            Archived => &[Archived],
        }
    }

    /// Whether moving from `self` to `next` is a transition the state machine
    /// permits. A disallowed move is never an error to the caller; see
    /// [`crate::service::LifecycleService::transition`], which silently
    /// coerces it to a no-op and logs a warning instead.
    pub fn can_transition_to(self, next: ExperimentState) -> bool {
        self == next || self.allowed_next().contains(&next)
    }
}
