use contracts::{AgentOutcome, AgentRequest, AgentRunner, AgentStatus, Effort};
use reasoning_graph::AgentRole;
use serde::Deserialize;
use uuid::Uuid;

use crate::complexity::{classify, Complexity};

/// The three agents Phase 1 deploys when a plan doesn't single any out.
pub const PRIMARY_ROLES: [AgentRole; 3] = [AgentRole::Analyst, AgentRole::Contrarian, AgentRole::Verifier];

/// One selected agent and the effort it should run at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedAgent {
    pub role: AgentRole,
    pub effort: Effort,
}

/// The outcome of Phase 0: which primary agents run, at what effort, over
/// what subtasks, and why.
#[derive(Debug, Clone)]
pub struct Plan {
    pub agents: Vec<PlannedAgent>,
    pub subtasks: Vec<String>,
    pub rationale: String,
    /// `true` when this plan came from the regex fallback rather than a
    /// parsed planner response.
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
struct PlannedAgentWire {
    role: String,
    effort: String,
}

#[derive(Debug, Deserialize)]
struct PlanWire {
    #[serde(default)]
    agents: Vec<PlannedAgentWire>,
    #[serde(default)]
    subtasks: Vec<String>,
    #[serde(default)]
    rationale: String,
}

fn role_from_str(s: &str) -> Option<AgentRole> {
    match s.to_ascii_lowercase().as_str() {
        "analyst" => Some(AgentRole::Analyst),
        "contrarian" => Some(AgentRole::Contrarian),
        "verifier" => Some(AgentRole::Verifier),
        "synthesizer" => Some(AgentRole::Synthesizer),
        "meta" => Some(AgentRole::Meta),
        "planner" => Some(AgentRole::Planner),
        _ => None,
    }
}

fn effort_from_str(s: &str) -> Option<Effort> {
    match s.to_ascii_lowercase().as_str() {
        "low" => Some(Effort::Low),
        "medium" => Some(Effort::Medium),
        "high" => Some(Effort::High),
        "max" => Some(Effort::Max),
        _ => None,
    }
}

fn parse_plan(outcome: &AgentOutcome) -> Option<Plan> {
    if outcome.status != AgentStatus::Completed {
        return None;
    }
    let wire: PlanWire = serde_json::from_str(&outcome.conclusion).ok()?;
    if wire.agents.is_empty() {
        return None;
    }

    let agents = wire
        .agents
        .into_iter()
        .filter_map(|a| Some(PlannedAgent { role: role_from_str(&a.role)?, effort: effort_from_str(&a.effort)? }))
        .collect::<Vec<_>>();
    if agents.is_empty() {
        return None;
    }

    Some(Plan { agents, subtasks: wire.subtasks, rationale: wire.rationale, fallback: false })
}

fn fallback_plan(query: &str) -> Plan {
    let complexity = classify(query);
    let effort = complexity.effort();
    Plan {
        agents: PRIMARY_ROLES.iter().map(|&role| PlannedAgent { role, effort }).collect(),
        subtasks: Vec::new(),
        rationale: format!("planner fallback: classified query as {complexity:?}, deploying all primary agents at {effort:?}"),
        fallback: true,
    }
}

/// Runs the planner agent with a 15-second deadline. Falls back to the regex
/// complexity classifier on timeout or on a response this crate can't parse
/// into a structured plan.
pub async fn run_planner(
    runner: &dyn AgentRunner,
    session_id: Uuid,
    query: &str,
    deadline: std::time::Duration,
) -> Plan {
    let request = AgentRequest::new(session_id, query, Effort::Medium);
    let result = tokio::time::timeout(deadline, runner.run(AgentRole::Planner, request)).await;

    match result {
        Ok(outcome) => parse_plan(&outcome).unwrap_or_else(|| {
            tracing::debug!(session_id = %session_id, "planner response unparseable, falling back to complexity classifier");
            fallback_plan(query)
        }),
        Err(_) => {
            tracing::debug!(session_id = %session_id, "planner timed out, falling back to complexity classifier");
            fallback_plan(query)
        }
    }
}
