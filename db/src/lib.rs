//! SQLite persistence for Hostlink.
//!
//! Implements the three repository traits declared in `hostlink-core`
//! (`AgentRepository`, `TaskRepository`, `NonceRepository`) against a single
//! SQLite connection pool, with migrations applied at startup.
//!
//! # Usage
//!
//! ```no_run
//! use hostlink_db::{connect, migrate};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = connect("sqlite://hostlink.sqlite").await?;
//! migrate(&pool).await?;
//! # Ok(())
//! # }
//! ```

mod common;
mod sqlite;

pub use sqlite::{connect, migrate, SqliteAgentRepository, SqliteNonceRepository, SqliteTaskRepository};

pub use hostlink_core::{
    error::{HostlinkError, Result},
    models::{
        Agent, AgentFilter, AgentRegistration, AgentStatus, AgentTag, NewTask, Nonce,
        RegisterAgentRequest, RegistrationEvent, Task, TaskFilter, TaskStatus, TaskUpdate,
    },
    repository::{AgentRepository, NonceRepository, TaskRepository},
};
