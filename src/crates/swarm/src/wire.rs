use serde::Serialize;

/// Renders a `#[serde(rename_all = "kebab-case")]` enum the same way the
/// wire format does, so event payloads and log fields agree with what a
/// client actually receives instead of Rust's `Debug` spelling.
pub fn kebab<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
