//! Background stale-session reaper.
//!
//! Neither the event bus nor the reasoning graph age out sessions on their
//! own — both are happy to hold state forever. This task periodically asks
//! the bus which sessions have gone quiet and tears down their bus queues
//! and graph nodes together, so a client that disconnects without ever
//! sending a checkpoint doesn't leak memory for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use event_bus::EventBus;
use reasoning_graph::ReasoningGraph;

/// How often the reaper wakes up to look for stale sessions.
pub const REAP_INTERVAL: Duration = Duration::from_secs(300);
/// A session with no bus activity for this long is considered abandoned.
pub const STALE_SESSION_MAX_AGE: Duration = Duration::from_secs(3600);

/// Spawns the reaper as a detached task and returns its handle so callers
/// that want to shut it down explicitly (tests, graceful shutdown) can abort
/// it; a production server is free to drop the handle and let it run for
/// the life of the process.
pub fn spawn(bus: Arc<EventBus>, graph: Arc<ReasoningGraph>) -> tokio::task::JoinHandle<()> {
    spawn_with_interval(bus, graph, REAP_INTERVAL, STALE_SESSION_MAX_AGE)
}

fn spawn_with_interval(
    bus: Arc<EventBus>,
    graph: Arc<ReasoningGraph>,
    interval: Duration,
    max_age: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            for session_id in bus.stale_sessions(max_age) {
                let removed = graph.cleanup_session(session_id);
                bus.cleanup_session(session_id);
                tracing::info!(%session_id, removed_nodes = removed, "reaped stale session");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn reaps_a_session_past_max_age_and_leaves_a_fresh_one_alone() {
        let bus = Arc::new(EventBus::new());
        let graph = Arc::new(ReasoningGraph::new());

        let stale_session = Uuid::new_v4();
        let _stale_sub = bus.subscribe(stale_session);
        graph.add_node(reasoning_graph::ReasoningNode::new(stale_session, reasoning_graph::AgentRole::Analyst, "old", 0.5));

        let handle = spawn_with_interval(bus.clone(), graph.clone(), Duration::from_millis(10), Duration::from_millis(0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(bus.subscriber_count(stale_session), 0);
        assert!(graph.get_session_nodes(stale_session).is_empty());
    }

    #[tokio::test]
    async fn a_session_within_max_age_is_left_alone() {
        let bus = Arc::new(EventBus::new());
        let graph = Arc::new(ReasoningGraph::new());

        let fresh_session = Uuid::new_v4();
        let _sub = bus.subscribe(fresh_session);
        graph.add_node(reasoning_graph::ReasoningNode::new(fresh_session, reasoning_graph::AgentRole::Analyst, "fresh", 0.5));

        let handle = spawn_with_interval(bus.clone(), graph.clone(), Duration::from_millis(10), Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(bus.subscriber_count(fresh_session), 1);
        assert_eq!(graph.get_session_nodes(fresh_session).len(), 1);
    }
}
