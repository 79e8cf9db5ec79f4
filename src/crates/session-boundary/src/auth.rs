//! HMAC-SHA256 bearer/WebSocket-token authentication.
//!
//! There's exactly one valid token per deployment: the hex digest of
//! `HMAC-SHA256(AUTH_SECRET, "opus-nx-authenticated")`. Clients present it as
//! `Authorization: Bearer <token>` over HTTP or `?token=<token>` on the
//! WebSocket upgrade. Comparison is constant-time so a timing side-channel
//! can't be used to guess the secret one byte at a time.

use axum::http::{header, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{ApiError, ApiResult};

type HmacSha256 = Hmac<Sha256>;

const AUTH_MESSAGE: &[u8] = b"opus-nx-authenticated";

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// The single valid token for this `secret`.
pub fn expected_token(secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any length");
    mac.update(AUTH_MESSAGE);
    to_hex(&mac.finalize().into_bytes())
}

/// Constant-time comparison against the expected token. Length is compared
/// in the clear first — that alone doesn't leak anything a fixed-format hex
/// digest doesn't already reveal — before the byte-for-byte constant-time
/// check.
pub fn verify_token(secret: &str, provided: &str) -> bool {
    let expected = expected_token(secret);
    if expected.len() != provided.len() {
        return false;
    }
    bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
}

/// Validates the `Authorization: Bearer <token>` header against `secret`.
pub fn check_bearer(headers: &HeaderMap, secret: &str) -> ApiResult<()> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".to_string()))?;

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Authorization header must be a Bearer token".to_string()))?;

    if verify_token(secret, token) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid bearer token".to_string()))
    }
}
