use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::SwarmEvent;

/// Bounded capacity for a subscriber queue. A slow subscriber is dropped
/// from, never blocked on.
pub const QUEUE_CAPACITY: usize = 500;

/// Minimum interval between "dropped events" warnings for a single session.
const DROP_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// A handle returned by [`EventBus::subscribe`]. Holds the receiving half of the
/// subscriber's queue; drop it (or call [`EventBus::unsubscribe`]) to stop receiving.
pub struct Subscription {
    pub id: Uuid,
    pub session_id: Uuid,
    pub receiver: mpsc::Receiver<SwarmEvent>,
}

struct Subscriber {
    id: Uuid,
    sender: mpsc::Sender<SwarmEvent>,
}

struct SessionState {
    subscribers: Mutex<Vec<Subscriber>>,
    last_activity: Mutex<Instant>,
    dropped: AtomicU64,
    last_drop_log: Mutex<Option<Instant>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            last_activity: Mutex::new(Instant::now()),
            dropped: AtomicU64::new(0),
            last_drop_log: Mutex::new(None),
        }
    }

    fn touch(&self) {
        *self.last_activity.lock().unwrap() = Instant::now();
    }
}

/// Process-wide registry of per-session subscriber queues.
///
/// Publishing never blocks: a full queue is dropped from, not waited on. Failing to
/// deliver to a slow subscriber is preferred over stalling the swarm.
#[derive(Default)]
pub struct EventBus {
    sessions: DashMap<Uuid, SessionState>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Registers a new bounded queue for `session_id` and returns its handle.
    pub fn subscribe(&self, session_id: Uuid) -> Subscription {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let id = Uuid::new_v4();

        let state = self
            .sessions
            .entry(session_id)
            .or_insert_with(SessionState::new);
        state.subscribers.lock().unwrap().push(Subscriber { id, sender });
        state.touch();

        debug!(session_id = %session_id, subscriber_id = %id, "subscribed");
        Subscription { id, session_id, receiver }
    }

    /// Removes a single subscriber queue. A no-op if already removed.
    pub fn unsubscribe(&self, session_id: Uuid, subscription_id: Uuid) {
        if let Some(state) = self.sessions.get(&session_id) {
            state
                .subscribers
                .lock()
                .unwrap()
                .retain(|s| s.id != subscription_id);
        }
        debug!(session_id = %session_id, subscriber_id = %subscription_id, "unsubscribed");
    }

    /// Fans `event` out to every subscriber of its session. Never awaits: a full
    /// queue is dropped from with at most one warning logged per 10-second window.
    ///
    /// Publishing to a session with zero subscribers is a no-op (aside from
    /// touching last-activity) — this is deliberate so the stale-session reaper
    /// doesn't prune a session the instant it's created with no listener yet.
    pub fn publish(&self, session_id: Uuid, event: SwarmEvent) {
        let state = self
            .sessions
            .entry(session_id)
            .or_insert_with(SessionState::new);
        state.touch();

        let subscribers = state.subscribers.lock().unwrap();
        if subscribers.is_empty() {
            return;
        }

        let mut dropped_now = 0u64;
        for sub in subscribers.iter() {
            if sub.sender.try_send(event.clone()).is_err() {
                dropped_now += 1;
            }
        }
        drop(subscribers);

        if dropped_now > 0 {
            let total = state.dropped.fetch_add(dropped_now, Ordering::Relaxed) + dropped_now;
            let mut last_log = state.last_drop_log.lock().unwrap();
            let should_log = last_log.map(|t| t.elapsed() >= DROP_LOG_INTERVAL).unwrap_or(true);
            if should_log {
                warn!(
                    session_id = %session_id,
                    dropped_now,
                    dropped_total = total,
                    "dropping events for slow or full subscriber queue"
                );
                *last_log = Some(Instant::now());
            }
        }
    }

    /// Removes all subscriber queues and bookkeeping for `session_id`, logging the
    /// total number of events dropped over the session's lifetime.
    pub fn cleanup_session(&self, session_id: Uuid) {
        if let Some((_, state)) = self.sessions.remove(&session_id) {
            let total_dropped = state.dropped.load(Ordering::Relaxed);
            info!(session_id = %session_id, total_dropped, "session cleaned up");
        }
    }

    /// Sessions whose last publish/subscribe activity is older than `max_age`.
    pub fn stale_sessions(&self, max_age: Duration) -> Vec<Uuid> {
        self.sessions
            .iter()
            .filter_map(|entry| {
                let last_activity = *entry.value().last_activity.lock().unwrap();
                if last_activity.elapsed() >= max_age {
                    Some(*entry.key())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Number of active subscribers for a session. Exposed for tests and metrics.
    pub fn subscriber_count(&self, session_id: Uuid) -> usize {
        self.sessions
            .get(&session_id)
            .map(|s| s.subscribers.lock().unwrap().len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_with_no_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        let session_id = Uuid::new_v4();
        bus.publish(session_id, SwarmEvent::ping(session_id));
        // no panic, no subscriber to deliver to
        assert_eq!(bus.subscriber_count(session_id), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_events_in_publish_order() {
        let bus = EventBus::new();
        let session_id = Uuid::new_v4();
        let mut sub = bus.subscribe(session_id);

        for i in 0..5 {
            bus.publish(
                session_id,
                SwarmEvent::AgentThinking {
                    session_id,
                    timestamp: chrono::Utc::now(),
                    agent: "analyst".into(),
                    delta: i.to_string(),
                },
            );
        }

        for i in 0..5 {
            let event = sub.receiver.recv().await.unwrap();
            match event {
                SwarmEvent::AgentThinking { delta, .. } => assert_eq!(delta, i.to_string()),
                _ => panic!("unexpected event"),
            }
        }
    }

    #[tokio::test]
    async fn session_isolation_keeps_events_from_crossing() {
        let bus = EventBus::new();
        let session_a = Uuid::new_v4();
        let session_b = Uuid::new_v4();
        let mut sub_b = bus.subscribe(session_b);

        bus.publish(session_a, SwarmEvent::ping(session_a));

        // give the (synchronous) publish a chance to have done anything wrong
        assert!(sub_b.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking_publisher() {
        let bus = EventBus::new();
        let session_id = Uuid::new_v4();
        let sub = bus.subscribe(session_id);

        for _ in 0..(QUEUE_CAPACITY + 10) {
            bus.publish(session_id, SwarmEvent::ping(session_id));
        }

        // publish returned for all of them without awaiting — queue just saturates
        drop(sub);
    }

    #[tokio::test]
    async fn unsubscribe_removes_the_queue() {
        let bus = EventBus::new();
        let session_id = Uuid::new_v4();
        let sub = bus.subscribe(session_id);
        assert_eq!(bus.subscriber_count(session_id), 1);

        bus.unsubscribe(session_id, sub.id);
        assert_eq!(bus.subscriber_count(session_id), 0);
    }

    #[tokio::test]
    async fn cleanup_session_removes_all_state() {
        let bus = EventBus::new();
        let session_id = Uuid::new_v4();
        let _sub = bus.subscribe(session_id);

        bus.cleanup_session(session_id);
        assert_eq!(bus.subscriber_count(session_id), 0);
    }

    #[tokio::test]
    async fn stale_sessions_reports_sessions_past_max_age() {
        let bus = EventBus::new();
        let session_id = Uuid::new_v4();
        let _sub = bus.subscribe(session_id);

        assert!(bus.stale_sessions(Duration::from_secs(3600)).is_empty());
        assert_eq!(bus.stale_sessions(Duration::from_secs(0)), vec![session_id]);
    }
}
