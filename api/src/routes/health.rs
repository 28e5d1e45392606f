//! `GET /health`. Reports repository reachability and the live nonce
//! count, the one metric the server exposes without a full metrics
//! backend.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let agents_ok = state.agents.health_check().await.is_ok();
    let tasks_ok = state.tasks.health_check().await.is_ok();
    let nonces_ok = state.nonces.health_check().await.is_ok();
    let nonce_count = state.nonces.count().await.unwrap_or(0);

    let healthy = agents_ok && tasks_ok && nonces_ok;
    Json(json!({
        "status": if healthy { "ok" } else { "degraded" },
        "nonce_count": nonce_count,
    }))
}
