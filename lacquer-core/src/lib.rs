//! lacquer-core: domain types and counter math for the lacquer marketplace
//!
//! Everything the server and CLI share lives here: validated domain models,
//! the derived-counter formulas (cart totals, reputation averages), pagination,
//! and configuration loading.

pub mod config;
pub mod counters;
pub mod models;

pub use config::LacquerConfig;
pub use models::{
    Email, ExchangeStatus, Paginated, Pagination, PaginationParams, Price, ProductCondition,
    ProductStatus, ProductType, Quantity, Rating, ReviewPolarity, Role, Slug, Username,
    ValidationError,
};
