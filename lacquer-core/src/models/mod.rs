//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod cart;
pub mod category;
pub mod exchange;
pub mod pagination;
pub mod product;
pub mod review;
pub mod user;
pub mod validation;

pub use cart::Quantity;
pub use category::Slug;
pub use exchange::ExchangeStatus;
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use product::{Price, ProductCondition, ProductStatus, ProductType};
pub use review::{Rating, ReviewPolarity};
pub use user::{Email, Role, Username};
pub use validation::ValidationError;
