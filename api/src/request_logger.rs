//! Structured request logging middleware.
//!
//! Single-line timestamped format with truncate-long-values behavior: logs
//! the HTTP method, path, and status for every request, redacting sensitive
//! header values along the way.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use chrono::Utc;
use std::time::Instant;

/// Maximum length for a logged header value before truncation.
const MAX_VALUE_LENGTH: usize = 30;

const TRUNCATION_SUFFIX: &str = "...";

/// Headers whose value is never safe to print verbatim: the signature
/// envelope (spec §4.3) and anything that looks like a credential.
const SENSITIVE_HEADER_NAMES: &[&str] = &[
    "x-signature",
    "x-nonce",
    "token_key",
    "public_key",
    "authorization",
];

/// Logs every request in the format:
/// `YYYY-MM-DD HH:MM:SS [METHOD path] [34 ms] status=200`
pub async fn request_logging_middleware(
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let agent_header = request
        .headers()
        .get("x-agent-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| truncate_string(s, MAX_VALUE_LENGTH));
    let sensitive_headers_present: Vec<&str> = SENSITIVE_HEADER_NAMES
        .iter()
        .filter(|name| request.headers().contains_key(**name))
        .copied()
        .collect();

    let response = next.run(request).await;
    let duration = start_time.elapsed();
    let status = response.status().as_u16();
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");

    let mut line = format!(
        "{timestamp} [{method} {path}] [{} ms] status={status}",
        duration.as_millis()
    );
    if let Some(agent_id) = agent_header {
        line.push_str(&format!(" agent_id=\"{agent_id}\""));
    }
    for name in &sensitive_headers_present {
        line.push_str(&format!(" {name}=\"[REDACTED]\""));
    }
    println!("{line}");

    Ok(response)
}

/// True if `key` names a field that must never be logged in full — by
/// exact header name or by keyword, covering Hostlink's own credential
/// surface (registration tokens, agent public keys, the request-signature
/// headers) alongside the generic password/token/secret/key/auth/credential
/// keyword list.
pub fn is_sensitive_parameter(key: &str) -> bool {
    let sensitive_keywords = [
        "password",
        "token",
        "secret",
        "signature",
        "nonce",
        "auth",
        "authorization",
        "credential",
        "api_key",
        "access_token",
        "refresh_token",
        "public_key",
    ];
    let key_lower = key.to_lowercase();
    sensitive_keywords
        .iter()
        .any(|&sensitive| key_lower.contains(sensitive))
}

fn truncate_string(input: &str, max_length: usize) -> String {
    if input.len() <= max_length {
        input.to_string()
    } else {
        let truncated_length = max_length.saturating_sub(TRUNCATION_SUFFIX.len());
        format!("{}{}", &input[..truncated_length], TRUNCATION_SUFFIX)
    }
}
