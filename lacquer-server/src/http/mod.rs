//! HTTP API layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing
//! - Graceful shutdown
//! - JSON error responses
//!
//! Identity comes from the `x-user-id` header, set by the gateway in
//! front of this service. There is no session handling here.

pub mod server;
pub mod error;
pub mod extractors;
pub mod routes;

pub use server::{run_server, ServerConfig};
pub use error::ApiError;
