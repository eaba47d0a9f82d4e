//! lacquer-server: persistence and HTTP layers for the lacquer marketplace
//!
//! The `db` module owns the connection pool, migrations, repositories, and
//! the derived-counter refreshes. The `http` module exposes the REST surface
//! on axum. Derived columns (favorites_count, cart totals, reputation
//! aggregates) are only ever written by the refresh functions, inside the
//! same transaction as the write that invalidated them.

pub mod db;
pub mod http;

pub use db::create_pool;
pub use http::{run_server, ServerConfig};
