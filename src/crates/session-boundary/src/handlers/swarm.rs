//! `POST /api/swarm` — starts a swarm run in the background and returns
//! immediately; progress streams over the WebSocket, not this response.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use event_bus::SwarmEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::check_bearer;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_QUERY_LEN: usize = 2000;

#[derive(Deserialize)]
pub struct StartSwarmRequest {
    pub session_id: Uuid,
    pub query: String,
}

#[derive(Serialize)]
struct StartSwarmResponse {
    status: &'static str,
    session_id: Uuid,
}

pub async fn start_swarm(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StartSwarmRequest>,
) -> ApiResult<impl IntoResponse> {
    check_bearer(&headers, &state.config.auth_secret)?;

    if req.query.trim().is_empty() {
        return Err(ApiError::ValidationError("query must not be empty".to_string()));
    }
    if req.query.chars().count() > MAX_QUERY_LEN {
        return Err(ApiError::ValidationError(format!("query exceeds {MAX_QUERY_LEN} characters")));
    }

    if !state.limiter.check(req.session_id) {
        return Err(ApiError::RateLimited(format!(
            "max {} requests per {}s",
            state.limiter.limit(),
            state.limiter.window().as_secs()
        )));
    }

    let coordinator = state.coordinator.clone();
    let bus = state.bus.clone();
    let session_id = req.session_id;
    let query = req.query.clone();

    let run = tokio::spawn(async move {
        coordinator.run(session_id, &query).await;
    });
    tokio::spawn(async move {
        if let Err(join_err) = run.await {
            tracing::error!(%session_id, %join_err, "swarm run task panicked");
            bus.publish(session_id, SwarmEvent::error(session_id, format!("swarm run failed: {join_err}")));
        }
    });

    Ok(crate::response::accepted(StartSwarmResponse { status: "started", session_id: req.session_id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_query_len_matches_the_documented_bound() {
        assert_eq!(MAX_QUERY_LEN, 2000);
    }
}
