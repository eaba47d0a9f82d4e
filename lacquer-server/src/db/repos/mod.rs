//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Handles conflicts via ON CONFLICT or SQLSTATE checks (no check-then-insert)
//! - Uses transactions for multi-step operations, including every
//!   derived-counter refresh

pub mod carts;
pub mod categories;
pub mod exchanges;
pub mod favorites;
pub mod products;
pub mod reviews;
pub mod users;

pub use carts::{Cart, CartDetail, CartItemDetail, CartRepo};
pub use categories::{Category, CategoryRepo, CategoryWithCount};
pub use exchanges::{ExchangeRepo, ExchangeRequest, ExchangeWithProducts};
pub use favorites::{FavoriteRepo, FavoriteToggle, FavoriteWithProduct};
pub use products::{
    NewProduct, Product, ProductChanges, ProductDetail, ProductFilter, ProductImage, ProductOrder,
    ProductRepo, ProductSummary,
};
pub use reviews::{Review, ReviewRepo, ReviewWithParties};
pub use users::{NewUser, Profile, ProfileChanges, Reputation, User, UserDetail, UserRepo};

/// Database error type shared by all repositories
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} {detail}")]
    Conflict {
        resource: &'static str,
        detail: &'static str,
    },

    #[error("forbidden: {reason}")]
    Forbidden { reason: &'static str },

    #[error("invalid request: {reason}")]
    Invalid { reason: &'static str },
}

/// SQLSTATE 23505: unique constraint violation.
///
/// The unique indexes on (user_id, product_id), (cart_id, product_id), and
/// (reviewer_id, reviewed_id) are the source of truth for duplicates; this
/// maps their violation to a 409 instead of a 500.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

/// SQLSTATE 23503: foreign key violation.
///
/// Hit when the acting user id from the request headers does not exist;
/// repositories map it to a 404 for the missing user.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503"))
}
