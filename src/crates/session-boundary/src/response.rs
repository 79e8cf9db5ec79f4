//! Plain JSON response helpers. No `{success, data}` envelope: the wire
//! contract here is a set of fixed-shape objects per endpoint, so these just
//! wrap a serializable value with a status code.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(data))
}

pub fn accepted<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::ACCEPTED, Json(data))
}
