//! Cart endpoints
//!
//! Every mutation returns the whole cart so clients never have to
//! reconcile partial state; the total is already refreshed server-side.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{CartDetail, CartItemDetail, CartRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use lacquer_core::models::Quantity;

/// Add item request
#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: Option<i32>,
}

/// Update item request; quantities below one remove the line
#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Cart line payload
#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub stock: i32,
    pub product_status: String,
}

impl From<CartItemDetail> for CartItemResponse {
    fn from(i: CartItemDetail) -> Self {
        Self {
            id: i.id.to_string(),
            product_id: i.product_id.to_string(),
            title: i.title,
            unit_price: i.unit_price,
            quantity: i.quantity,
            line_total: i.line_total,
            stock: i.stock,
            product_status: i.product_status,
        }
    }
}

/// Whole-cart payload
#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub total: Decimal,
    pub items: Vec<CartItemResponse>,
}

impl From<CartDetail> for CartResponse {
    fn from(d: CartDetail) -> Self {
        Self {
            id: d.cart.id.to_string(),
            total: d.cart.total,
            items: d.items.into_iter().map(CartItemResponse::from).collect(),
        }
    }
}

/// GET /cart - the acting user's cart
async fn get_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let detail = CartRepo::new(&state.pool).get_detail(user_id).await?;
    Ok(Json(CartResponse::from(detail)))
}

/// POST /cart/items - add a product (quantities merge)
async fn add_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let quantity = Quantity::new(req.quantity.unwrap_or(1))?;
    let detail = CartRepo::new(&state.pool)
        .add_item(user_id, req.product_id, quantity)
        .await?;
    Ok(Json(CartResponse::from(detail)))
}

/// PUT /cart/items/{id} - set a line's quantity
async fn update_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(item_id): ValidUuid,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let detail = CartRepo::new(&state.pool)
        .set_item_quantity(user_id, item_id, req.quantity)
        .await?;
    Ok(Json(CartResponse::from(detail)))
}

/// DELETE /cart/items/{id} - remove a line
async fn remove_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(item_id): ValidUuid,
) -> Result<Json<CartResponse>, ApiError> {
    let detail = CartRepo::new(&state.pool)
        .remove_item(user_id, item_id)
        .await?;
    Ok(Json(CartResponse::from(detail)))
}

/// DELETE /cart - empty the cart
async fn clear_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let detail = CartRepo::new(&state.pool).clear(user_id).await?;
    Ok(Json(CartResponse::from(detail)))
}

/// Cart routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/{id}", delete(remove_item).put(update_item))
}

#[cfg(test)]
mod tests {
    // Integration tests with test database
    // Run with: DATABASE_URL=... cargo test -p lacquer-server -- --ignored
}
