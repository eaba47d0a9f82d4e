//! Database layer - connection pool, migrations, and repositories
//!
//! # Design Principles
//!
//! - Connection pool (max 5 connections) - no Arc<Mutex<Connection>>
//! - All list operations use JOINs - no N+1 queries
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step operations
//! - Derived columns are written only by the `counters` refresh functions,
//!   inside the same transaction as the triggering write

pub mod counters;
pub mod migrations;
pub mod pool;
pub mod repos;

#[cfg(test)]
pub(crate) mod testutil;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
