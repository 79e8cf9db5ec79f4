//! `GET /api/health` — liveness only, no auth, no dependency checks.

use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> impl IntoResponse {
    crate::response::ok(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}
