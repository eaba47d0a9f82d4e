//! Category endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::db::repos::{CategoryRepo, CategoryWithCount, ProductRepo};
use crate::http::error::ApiError;
use crate::http::routes::products::{ListProductsParams, ProductSummaryResponse};
use crate::http::server::AppState;
use lacquer_core::models::Paginated;

/// Category payload with its available-product count
#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub product_count: i64,
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(c: CategoryWithCount) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            slug: c.slug,
            description: c.description,
            icon: c.icon,
            product_count: c.product_count,
        }
    }
}

/// GET /categories - active categories with counts
async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = CategoryRepo::new(&state.pool).list_active().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// GET /categories/{slug} - a single category
async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = CategoryRepo::new(&state.pool).get_by_slug(&slug).await?;
    Ok(Json(CategoryResponse::from(category)))
}

/// GET /categories/{slug}/products - the category's catalog page
async fn category_products(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<Paginated<ProductSummaryResponse>>, ApiError> {
    // 404 for unknown slugs instead of an empty page
    CategoryRepo::new(&state.pool).get_by_slug(&slug).await?;

    let (mut filter, page) = params.try_into_filter()?;
    filter.category_slug = Some(slug);

    let result = ProductRepo::new(&state.pool).search(&filter, page).await?;
    Ok(Json(result.map(ProductSummaryResponse::from)))
}

/// Category routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{slug}", get(get_category))
        .route("/categories/{slug}/products", get(category_products))
}

#[cfg(test)]
mod tests {
    // Integration tests with test database
    // Run with: DATABASE_URL=... cargo test -p lacquer-server -- --ignored
}
