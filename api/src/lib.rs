//! HTTP surface for the Hostlink control plane (spec §6).
//!
//! Wires [`hostlink_core`]'s domain services to axum: route handlers in
//! [`routes`], signature authentication in [`auth`], error-to-HTTP mapping
//! in [`error`], and request logging in [`request_logger`]. [`server`]
//! assembles the whole thing into one [`axum::Router`].
//!
//! # Usage
//!
//! ```no_run
//! use hostlink_api::{build_router, AppState};
//! use hostlink_api::auth::SignatureAuth;
//! use std::sync::Arc;
//!
//! # async fn start_server(agents: std::sync::Arc<dyn hostlink_core::AgentRepository>,
//! #     tasks: std::sync::Arc<dyn hostlink_core::TaskRepository>,
//! #     nonces: std::sync::Arc<dyn hostlink_core::NonceRepository>)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(agents, tasks, nonces, SignatureAuth::new(true));
//! let app = build_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod request_logger;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::build_router;
pub use state::AppState;
