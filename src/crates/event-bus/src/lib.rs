//! Per-session publish/subscribe event bus.
//!
//! Fans typed [`SwarmEvent`]s out to bounded subscriber queues, one set of queues
//! per session. Publishing never blocks the caller: a full queue is dropped from,
//! never waited on, so a slow WebSocket client can't stall the swarm it's watching.

mod bus;
mod event;

pub use bus::{EventBus, Subscription, QUEUE_CAPACITY};
pub use event::SwarmEvent;
