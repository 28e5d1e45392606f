//! Signature authentication middleware (spec §4.3).
//!
//! A small `Clone`-able struct holding config, with an async `validate`
//! method that takes a `&HeaderMap` and returns a typed outcome, wired in as
//! an axum `from_fn_with_state` layer. Verification is RSA-PSS signature
//! checking plus nonce dedup rather than bearer-token lookup.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use hostlink_core::{signature, HostlinkError, Nonce, NonceRepository, Result};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Maximum allowed drift between the client's `X-Timestamp` and wall-clock
/// time, in either direction (spec §4.3).
pub const TIMESTAMP_SKEW_SECS: i64 = 300;

/// The agent id established by a successful signature check, threaded to
/// the downstream handler via request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedAgent(pub String);

/// Config for the authenticator. `enabled = false` is a development escape
/// hatch — Hostlink always runs with it `true` in production, but tests and
/// local runs can disable it to exercise unsigned requests directly.
#[derive(Debug, Clone, Copy)]
pub struct SignatureAuth {
    enabled: bool,
}

impl SignatureAuth {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Runs the full algorithm of spec §4.3 against a request's headers,
    /// given access to the agent and nonce repositories.
    pub async fn validate(
        &self,
        headers: &HeaderMap,
        state: &AppState,
    ) -> Result<AuthenticatedAgent> {
        if !self.enabled {
            return Ok(AuthenticatedAgent("dev-agent".to_string()));
        }

        let agent_id = header_str(headers, "x-agent-id").ok_or(HostlinkError::Unauthenticated)?;
        let timestamp = header_str(headers, "x-timestamp").ok_or(HostlinkError::Unauthenticated)?;
        let nonce = header_str(headers, "x-nonce").ok_or(HostlinkError::Unauthenticated)?;
        let signature_b64 =
            header_str(headers, "x-signature").ok_or(HostlinkError::Unauthenticated)?;

        let ts: i64 = timestamp.parse().map_err(|_| HostlinkError::Unauthenticated)?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > TIMESTAMP_SKEW_SECS {
            warn!(agent_id = %agent_id, "request timestamp outside allowed skew");
            return Err(HostlinkError::Unauthenticated);
        }

        // Insert-or-reject up front: the unique constraint on `value` is
        // what makes this atomic under concurrent requests with the same
        // nonce, and rejecting a replay here avoids paying for an RSA
        // verification on a request we already know is a replay.
        state
            .nonces
            .save(Nonce {
                value: nonce.to_string(),
                created_at: Utc::now(),
            })
            .await
            .map_err(|_| HostlinkError::Unauthenticated)?;

        let public_key = state
            .agents
            .get_public_key(&agent_id)
            .await
            .map_err(|_| HostlinkError::Unauthenticated)?;

        let message = signature::signing_message(&agent_id, timestamp, nonce);
        if !signature::verify_signature(&public_key, &message, signature_b64) {
            warn!(agent_id = %agent_id, "signature verification failed");
            return Err(HostlinkError::Unauthenticated);
        }

        if let Err(e) = state.agents.touch_last_seen(&agent_id).await {
            warn!(agent_id = %agent_id, error = %e, "failed to bump last_seen");
        }

        info!(agent_id = %agent_id, "request authenticated");
        Ok(AuthenticatedAgent(agent_id.to_string()))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

/// axum middleware entry point for routes under the signed surface
/// (`GET /api/v1/tasks`, `PUT /api/v1/tasks/{id}`).
pub async fn require_signature(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = Arc::clone(&state.auth);
    let agent = auth.validate(request.headers(), &state).await?;
    request.extensions_mut().insert(agent);
    Ok(next.run(request).await)
}
