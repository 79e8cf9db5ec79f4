//! Request intake and streaming boundary for the swarm orchestrator.
//!
//! Everything a client talks to lives here: bearer-token REST handlers,
//! the `/ws/{session_id}` upgrade with its heartbeat/drain loops, and the
//! sliding-window rate limiter guarding `POST /api/swarm`. This crate owns
//! no reasoning state itself — it threads [`AppState`] into handlers that
//! call straight into `reasoning-graph`, `event-bus`, `swarm`, and
//! `lifecycle`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod reaper;
pub mod response;
pub mod routes;
pub mod state;
pub mod ws;

pub use routes::create_router;
pub use state::AppState;
