//! Three-phase swarm coordinator: rehydrate prior context, plan which agents
//! run, fan them out in parallel with staggered launch and per-agent
//! timeouts, synthesize their conclusions, then reflect on the whole run.

mod complexity;
mod coordinator;
mod meta;
mod phase1;
mod plan;
mod result;
mod retry;
mod settings;
mod synthesis;
mod wire;

pub use complexity::{classify, Complexity};
pub use coordinator::SwarmCoordinator;
pub use plan::{Plan, PlannedAgent, PRIMARY_ROLES};
pub use result::{RerunSummary, SwarmResult};
pub use settings::CoordinatorSettings;
