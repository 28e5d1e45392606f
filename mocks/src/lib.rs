//! Mock implementations and test utilities for the Hostlink control-plane
//! server.
//!
//! This crate provides testing infrastructure shared across
//! `hostlink-core`, `hostlink-api`, and `hostlink-server`:
//! - In-memory mock implementations of all three repository traits
//! - Fluent builders and realistic data generators
//! - Custom assertion helpers
//! - Contract test suites any repository implementation should pass

pub mod assertions;
pub mod builders;
pub mod contracts;
pub mod fixtures;
pub mod generators;
pub mod repository;

pub use assertions::*;
pub use builders::*;
pub use contracts::*;
pub use fixtures::*;
pub use generators::*;
pub use repository::{MockAgentRepository, MockNonceRepository, MockTaskRepository};
