//! Hostlink server library.
//!
//! Provides configuration loading, database setup/migration, and process
//! wiring (telemetry, graceful shutdown, the nonce sweeper) for the
//! Hostlink control-plane binary.

pub mod config;
pub mod setup;
pub mod telemetry;

pub use config::Config;
pub use setup::{ensure_database_directory, initialize_app, spawn_nonce_sweeper};
pub use telemetry::init_telemetry;
