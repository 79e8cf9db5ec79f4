use std::time::Duration;

/// Timing knobs for a coordinator run. Mirrors `swarm-config::SwarmConfig`'s
/// agent fields but lives here, decoupled from env parsing, so the coordinator
/// can be exercised in tests without going through `SwarmConfig::from_env`.
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    pub agent_timeout: Duration,
    pub agent_stagger: Duration,
    pub planner_deadline: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(120),
            agent_stagger: Duration::from_millis(2500),
            planner_deadline: Duration::from_secs(15),
        }
    }
}

impl CoordinatorSettings {
    pub fn from_seconds(agent_timeout_seconds: u64, agent_stagger_seconds: f64) -> Self {
        Self {
            agent_timeout: Duration::from_secs(agent_timeout_seconds),
            agent_stagger: Duration::from_secs_f64(agent_stagger_seconds),
            ..Self::default()
        }
    }
}
