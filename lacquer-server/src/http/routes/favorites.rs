//! Favorite endpoints
//!
//! One toggle route under /products, one list under /favorites. The
//! toggle response carries the refreshed counter so clients can update
//! the card in place.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::repos::{FavoriteRepo, FavoriteWithProduct};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use lacquer_core::models::{Paginated, Pagination, PaginationParams};

/// Toggle outcome payload
#[derive(Serialize)]
pub struct ToggleResponse {
    pub favorited: bool,
    pub favorites_count: i32,
}

/// Favorite payload with the product it points at
#[derive(Serialize)]
pub struct FavoriteResponse {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub price: Decimal,
    pub status: String,
    pub primary_image: Option<String>,
    pub favorited_at: String,
}

impl From<FavoriteWithProduct> for FavoriteResponse {
    fn from(f: FavoriteWithProduct) -> Self {
        Self {
            id: f.id.to_string(),
            product_id: f.product_id.to_string(),
            title: f.title,
            price: f.price,
            status: f.status,
            primary_image: f.primary_image,
            favorited_at: f.favorited_at.to_rfc3339(),
        }
    }
}

/// POST /products/{id}/favorite - toggle a favorite
async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(product_id): ValidUuid,
) -> Result<Json<ToggleResponse>, ApiError> {
    let outcome = FavoriteRepo::new(&state.pool)
        .toggle(user_id, product_id)
        .await?;
    Ok(Json(ToggleResponse {
        favorited: outcome.favorited,
        favorites_count: outcome.favorites_count,
    }))
}

/// GET /favorites - the acting user's favorites
async fn list_favorites(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<FavoriteResponse>>, ApiError> {
    let page = Pagination::from(params);
    let result = FavoriteRepo::new(&state.pool)
        .list_for_user(user_id, page)
        .await?;
    Ok(Json(result.map(FavoriteResponse::from)))
}

/// Favorite routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products/{id}/favorite", post(toggle_favorite))
        .route("/favorites", get(list_favorites))
}
