//! Interface-only contracts between the coordinator and the two systems it
//! depends on but does not implement: a language-model agent runner and an
//! external persistence store.
//!
//! Both traits are exercised in tests via the in-memory doubles in
//! [`doubles`] rather than a real model or database.

mod agent_runner;
mod doubles;
mod error;
mod persistence_gateway;
mod types;

pub use agent_runner::AgentRunner;
pub use doubles::{NullGateway, ScriptedAgentRunner};
pub use error::PersistenceError;
pub use persistence_gateway::PersistenceGateway;
pub use types::{
    AgentOutcome, AgentRequest, AgentStatus, CapabilitiesSnapshot, Effort, ExperimentAction, ExperimentPatch,
    RehydrationRunRecord, RetrievedArtifact, RetrievedHypothesis,
};
