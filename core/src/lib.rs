//! Hostlink Core Library
//!
//! Foundational domain models, business logic, and trait interfaces for the
//! Hostlink control-plane server. All other crates in this workspace depend
//! on the types and interfaces defined here.
//!
//! # Architecture
//!
//! - [`models`] — domain types (`Agent`, `Task`, `Nonce`, …)
//! - [`error`] — error kinds and result handling
//! - [`repository`] — persistence trait interfaces (`AgentRepository`, `TaskRepository`, `NonceRepository`)
//! - [`registration`] — the registration service (agent identity lifecycle)
//! - [`task_service`] — task CRUD, poll, and update
//! - [`signature`] — stateless RSA-PSS/SHA-256 signature verification
//! - [`ids`] — opaque id minting
//! - [`validation`] — request validation

pub mod error;
pub mod ids;
pub mod models;
pub mod registration;
pub mod repository;
pub mod signature;
pub mod task_service;
pub mod validation;

pub use error::{HostlinkError, Result};
pub use models::{
    Agent, AgentFilter, AgentRegistration, AgentStatus, AgentTag, NewTask, Nonce,
    RegisterAgentRequest, RegisterAgentResponse, RegistrationEvent, Task, TaskFilter, TaskStatus,
    TaskUpdate,
};
pub use registration::RegistrationService;
pub use repository::{AgentRepository, NonceRepository, TaskRepository};
pub use task_service::TaskService;
pub use validation::HostlinkValidator;

/// Current version of the core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current crate name.
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_constants_are_populated() {
        assert!(!VERSION.is_empty());
        assert_eq!(CRATE_NAME, "hostlink-core");
    }

    #[test]
    fn re_exports_resolve() {
        let status = TaskStatus::Pending;
        assert_eq!(status.to_string(), "pending");

        let error = HostlinkError::not_found_agent("agt_1");
        assert!(error.is_not_found());
    }
}
