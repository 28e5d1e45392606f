//! Shared application state threaded through the axum router.
//!
//! Repositories are held as trait objects rather than generic parameters so
//! the router type itself stays simple — `hostlink-server` builds one
//! concrete `AppState` at startup (backed by `hostlink-db`'s SQLite
//! repositories) and hands it to [`crate::server::build_router`].

use std::sync::Arc;

use hostlink_core::{AgentRepository, NonceRepository, TaskRepository};

use crate::auth::SignatureAuth;

#[derive(Clone)]
pub struct AppState {
    pub agents: Arc<dyn AgentRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub nonces: Arc<dyn NonceRepository>,
    pub auth: Arc<SignatureAuth>,
}

impl AppState {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        tasks: Arc<dyn TaskRepository>,
        nonces: Arc<dyn NonceRepository>,
        auth: SignatureAuth,
    ) -> Self {
        Self {
            agents,
            tasks,
            nonces,
            auth: Arc::new(auth),
        }
    }
}

#[cfg(test)]
pub async fn test_state_with_agent(agent: Option<hostlink_core::Agent>) -> AppState {
    use hostlink_mocks::{MockAgentRepository, MockNonceRepository, MockTaskRepository};

    let agents = MockAgentRepository::new();
    if let Some(agent) = agent {
        agents.seed(agent);
    }

    AppState::new(
        Arc::new(agents),
        Arc::new(MockTaskRepository::new()),
        Arc::new(MockNonceRepository::new()),
        SignatureAuth::new(true),
    )
}
