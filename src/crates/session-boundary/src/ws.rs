//! WebSocket boundary: `/ws/{session_id}?token=...`.
//!
//! The token is checked *before* accepting the upgrade: an invalid token
//! gets a plain HTTP rejection rather than an accept-then-close round trip.
//! Once accepted, three cooperative tasks share the socket: deliver (bus
//! events out), heartbeat (idle detection + pings), and drain (discard
//! client frames).

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use event_bus::{EventBus, SwarmEvent};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::verify_token;
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<WsAuthQuery>,
) -> Response {
    if !verify_token(&state.config.auth_secret, &query.token) {
        return (StatusCode::UNAUTHORIZED, "invalid or missing token").into_response();
    }

    let bus = state.bus.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, bus, session_id))
}

fn now_millis(base: &Instant, at: Instant) -> u64 {
    at.saturating_duration_since(*base).as_millis() as u64
}

async fn handle_socket(socket: WebSocket, bus: Arc<EventBus>, session_id: Uuid) {
    let subscription = bus.subscribe(session_id);
    let subscription_id = subscription.id;
    let mut receiver = subscription.receiver;

    let (sink, mut incoming) = socket.split();
    let sink = Arc::new(tokio::sync::Mutex::new(sink));

    let start = Instant::now();
    let last_event_ms = Arc::new(AtomicU64::new(now_millis(&start, Instant::now())));

    let mut deliver_handle = tokio::spawn({
        let sink = Arc::clone(&sink);
        let last_event_ms = Arc::clone(&last_event_ms);
        async move {
            while let Some(event) = receiver.recv().await {
                last_event_ms.store(now_millis(&start, Instant::now()), Ordering::Relaxed);
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if sink.lock().await.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut heartbeat_handle = tokio::spawn({
        let sink = Arc::clone(&sink);
        let last_event_ms = Arc::clone(&last_event_ms);
        async move {
            let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let idle_for = now_millis(&start, Instant::now()).saturating_sub(last_event_ms.load(Ordering::Relaxed));
                if idle_for >= IDLE_TIMEOUT.as_millis() as u64 {
                    let payload = serde_json::json!({"event": "error", "code": 4002, "reason": "idle_timeout"});
                    let mut guard = sink.lock().await;
                    let _ = guard.send(Message::Text(payload.to_string())).await;
                    let _ = guard
                        .send(Message::Close(Some(CloseFrame { code: 4002, reason: Cow::Borrowed("idle_timeout") })))
                        .await;
                    break;
                }
                let ping = serde_json::to_string(&SwarmEvent::ping(session_id)).unwrap_or_default();
                if sink.lock().await.send(Message::Text(ping)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Client frames aren't part of this protocol — drain and discard them so
    // the underlying connection's read buffer doesn't back up, and notice
    // when the client closes or the connection errors.
    let mut drain_handle = tokio::spawn(async move {
        while let Some(frame) = incoming.next().await {
            if frame.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        result = &mut deliver_handle => {
            if let Err(err) = result {
                tracing::debug!(%session_id, %err, "deliver task ended abnormally");
            }
        }
        result = &mut heartbeat_handle => {
            if let Err(err) = result {
                tracing::debug!(%session_id, %err, "heartbeat task ended abnormally");
            }
        }
        result = &mut drain_handle => {
            if let Err(err) = result {
                tracing::debug!(%session_id, %err, "drain task ended abnormally");
            }
        }
    }

    deliver_handle.abort();
    heartbeat_handle.abort();
    drain_handle.abort();

    bus.unsubscribe(session_id, subscription_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_interval_is_well_under_idle_timeout() {
        assert!(HEARTBEAT_INTERVAL.as_secs() * 3 < IDLE_TIMEOUT.as_secs());
    }
}
