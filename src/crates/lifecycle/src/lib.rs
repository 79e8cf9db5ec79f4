//! State machine over hypothesis experiments.
//!
//! A [`LifecycleService`] owns the in-memory, authoritative record of every
//! experiment a session's checkpoints have promoted, and opportunistically
//! mirrors it to an external store through [`contracts::PersistenceGateway`].
//! The in-memory map is never wrong; a gateway failure only ever flips the
//! service into degraded mode.

mod experiment;
mod metrics;
mod service;
mod state;

pub use experiment::HypothesisExperiment;
pub use metrics::{Metrics, MetricsSnapshot, RetentionRatio};
pub use service::{CompareOutcome, LifecycleService, RetentionDecision};
pub use state::ExperimentState;
