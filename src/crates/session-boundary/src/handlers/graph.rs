//! `GET /api/graph/{session_id}` — a read-only snapshot of the reasoning
//! graph for one session. No auth: the graph itself carries nothing a
//! connected client couldn't already see over its WebSocket.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use reasoning_graph::{GraphSnapshot, ReasoningNode};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Serialize)]
struct GraphResponse {
    nodes: Vec<ReasoningNode>,
    graph: GraphSnapshot,
}

pub async fn get_graph(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> impl IntoResponse {
    let graph = state.graph.to_snapshot(session_id);
    crate::response::ok(GraphResponse { nodes: graph.nodes.clone(), graph })
}
