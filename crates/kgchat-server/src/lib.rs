//! HTTP surface for the knowledge-graph chat service.
//!
//! Three routes read the backend lifecycle:
//!
//! - `GET /api/status` returns the [`StatusSnapshot`](kgchat_backend::StatusSnapshot).
//! - `POST /api/chat` forwards `{"message": ...}` to the agent.
//! - `GET /api/health` reports liveness.
//!
//! The `kgchatd` binary starts initialization in the background and serves
//! these routes immediately.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod routes;
mod supervisor;

pub use error::{ApiError, ApiResult};
pub use routes::{AppState, ChatRequest, ChatResponse, HealthResponse, chat_directive, router};
pub use supervisor::{
    build_backend, log_config, serve_with_grace, shutdown_signal, spawn_initialization,
};
