//! `GET /api/system/capabilities` — the startup capability probe result,
//! cached for the lifetime of the process. No auth: a read-only shape of
//! what's configured, not of any session's data.

use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct SupabaseCapabilities {
    configured: bool,
    tables: bool,
    rpc: bool,
    lifecycle_ready: bool,
    rehydration_ready: bool,
}

#[derive(Serialize)]
struct CapabilitiesResponse {
    supabase: SupabaseCapabilities,
    degraded_mode: bool,
    degraded_reason: Option<String>,
}

pub async fn capabilities(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.capabilities.snapshot;
    crate::response::ok(CapabilitiesResponse {
        supabase: SupabaseCapabilities {
            configured: snapshot.configured,
            tables: snapshot.tables,
            rpc: snapshot.rpc,
            lifecycle_ready: snapshot.lifecycle_ready,
            rehydration_ready: snapshot.rehydration_ready,
        },
        degraded_mode: state.capabilities.degraded_reason.is_some() || state.lifecycle.degraded_mode(),
        degraded_reason: state.capabilities.degraded_reason.clone(),
    })
}
