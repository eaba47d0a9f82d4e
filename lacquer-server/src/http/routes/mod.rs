//! Route handlers organized by resource

pub mod health;
pub mod users;
pub mod categories;
pub mod products;
pub mod favorites;
pub mod carts;
pub mod exchanges;
pub mod reviews;
