//! Router assembly: wires the route handlers in [`crate::routes`] to the
//! HTTP surface of spec §6, layering the signature-auth middleware only
//! over the agent-facing `v1` task endpoints.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::require_signature;
use crate::request_logger::request_logging_middleware;
use crate::routes::{agents, health, tasks};
use crate::state::AppState;

/// Builds the complete application [`Router`], ready to hand to
/// `axum::serve`. Callers (namely `hostlink-server`) own binding the
/// listener; this crate only owns routing and request handling.
pub fn build_router(state: AppState) -> Router {
    let v1_agents = Router::new()
        .route("/register", post(agents::register))
        .route("/", get(agents::list))
        .route("/:id", get(agents::get));

    let v1_tasks_signed = Router::new()
        .route("/", get(tasks::poll))
        .route("/:id", put(tasks::update))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_signature,
        ));

    let v2_tasks = Router::new()
        .route("/", post(tasks::create).get(tasks::list))
        .route("/:id", get(tasks::get));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1/agents", v1_agents)
        .nest("/api/v1/tasks", v1_tasks_signed)
        .nest("/api/v2/tasks", v2_tasks)
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}
