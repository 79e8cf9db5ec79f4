use async_trait::async_trait;
use reasoning_graph::AgentRole;

use crate::types::{AgentOutcome, AgentRequest};

/// The boundary between the coordinator and whatever actually thinks.
///
/// This crate ships no implementation of this trait: producing an
/// [`AgentOutcome`] from a language model is out of scope here. The
/// coordinator is written entirely against this interface so it can be driven
/// in tests by [`crate::doubles::ScriptedAgentRunner`] without a real model
/// behind it.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, role: AgentRole, request: AgentRequest) -> AgentOutcome;
}
