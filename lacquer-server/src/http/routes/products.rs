//! Product endpoints
//!
//! The catalog list, seller CRUD, view counting, similar/featured rails
//! and image management. Identity is only required for writes; browsing
//! works anonymously.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{
    NewProduct, Product, ProductChanges, ProductDetail, ProductFilter, ProductImage, ProductOrder,
    ProductRepo, ProductSummary,
};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, MaybeUser, ValidUuid};
use crate::http::server::AppState;
use lacquer_core::models::{
    Paginated, Pagination, PaginationParams, Price, ProductCondition, ProductStatus, ProductType,
    ValidationError,
};

const MAX_TITLE_LEN: usize = 200;

/// Catalog query parameters
#[derive(Deserialize, Default)]
pub struct ListProductsParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub category_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub status: Option<String>,
    pub product_type: Option<String>,
    pub condition: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub order: Option<String>,
}

impl ListProductsParams {
    /// Parse the raw query strings into a typed filter and page window.
    pub fn try_into_filter(self) -> Result<(ProductFilter, Pagination), ApiError> {
        let order = match self.order.as_deref() {
            Some(raw) => ProductOrder::from_param(raw)?,
            None => ProductOrder::default(),
        };
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ProductStatus>)
            .transpose()?;
        let product_type = self
            .product_type
            .as_deref()
            .map(str::parse::<ProductType>)
            .transpose()?;
        let condition = self
            .condition
            .as_deref()
            .map(str::parse::<ProductCondition>)
            .transpose()?;

        let page = Pagination::from(PaginationParams {
            page: self.page,
            per_page: self.per_page,
        });
        let filter = ProductFilter {
            q: self.q,
            category_id: self.category_id,
            category_slug: self.category,
            seller_id: self.seller_id,
            status,
            product_type,
            condition,
            min_price: self.min_price,
            max_price: self.max_price,
            city: self.city,
            state: self.state,
            brand: self.brand,
            color: self.color,
            order,
        };

        Ok((filter, page))
    }
}

/// Create product request
#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub product_type: Option<String>,
    pub condition: String,
    pub price: Decimal,
    pub stock: Option<i32>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Update product request; absent fields are left unchanged
#[derive(Deserialize, Default)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_type: Option<String>,
    pub condition: Option<String>,
    pub status: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Attach image request
#[derive(Deserialize)]
pub struct AddImageRequest {
    pub image_path: String,
    pub alt_text: Option<String>,
    pub is_primary: Option<bool>,
    pub position: Option<i32>,
}

/// Seller reference embedded in product payloads
#[derive(Serialize)]
pub struct SellerRef {
    pub id: String,
    pub username: String,
}

/// Category reference embedded in product payloads
#[derive(Serialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// Full product payload, returned from create/update
#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub seller_id: String,
    pub category_id: String,
    pub title: String,
    pub description: String,
    pub product_type: String,
    pub condition: String,
    pub status: String,
    pub price: Decimal,
    pub stock: i32,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub views: i32,
    pub favorites_count: i32,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            seller_id: p.seller_id.to_string(),
            category_id: p.category_id.to_string(),
            title: p.title,
            description: p.description,
            product_type: p.product_type,
            condition: p.condition,
            status: p.status,
            price: p.price,
            stock: p.stock,
            brand: p.brand,
            color: p.color,
            size: p.size,
            city: p.city,
            state: p.state,
            views: p.views,
            favorites_count: p.favorites_count,
            expires_at: p.expires_at.map(|t| t.to_rfc3339()),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Card payload for grids and rails
#[derive(Serialize)]
pub struct ProductSummaryResponse {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    pub product_type: String,
    pub condition: String,
    pub status: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub views: i32,
    pub favorites_count: i32,
    pub created_at: String,
    pub seller: SellerRef,
    pub category: CategoryRef,
    pub primary_image: Option<String>,
}

impl From<ProductSummary> for ProductSummaryResponse {
    fn from(p: ProductSummary) -> Self {
        Self {
            id: p.id.to_string(),
            title: p.title,
            price: p.price,
            product_type: p.product_type,
            condition: p.condition,
            status: p.status,
            city: p.city,
            state: p.state,
            views: p.views,
            favorites_count: p.favorites_count,
            created_at: p.created_at.to_rfc3339(),
            seller: SellerRef {
                id: p.seller_id.to_string(),
                username: p.seller_username,
            },
            category: CategoryRef {
                id: p.category_id.to_string(),
                name: p.category_name,
                slug: p.category_slug,
            },
            primary_image: p.primary_image,
        }
    }
}

/// Image payload
#[derive(Serialize)]
pub struct ImageResponse {
    pub id: String,
    pub image_path: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub position: i32,
}

impl From<ProductImage> for ImageResponse {
    fn from(i: ProductImage) -> Self {
        Self {
            id: i.id.to_string(),
            image_path: i.image_path,
            alt_text: i.alt_text,
            is_primary: i.is_primary,
            position: i.position,
        }
    }
}

/// Detail payload for the product page
#[derive(Serialize)]
pub struct ProductDetailResponse {
    pub id: String,
    pub seller: SellerRef,
    pub category: CategoryRef,
    pub title: String,
    pub description: String,
    pub product_type: String,
    pub condition: String,
    pub status: String,
    pub price: Decimal,
    pub stock: i32,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub views: i32,
    pub favorites_count: i32,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub images: Vec<ImageResponse>,
}

impl From<ProductDetail> for ProductDetailResponse {
    fn from(d: ProductDetail) -> Self {
        let p = d.product;
        Self {
            id: p.id.to_string(),
            seller: SellerRef {
                id: p.seller_id.to_string(),
                username: d.seller_username,
            },
            category: CategoryRef {
                id: p.category_id.to_string(),
                name: d.category_name,
                slug: d.category_slug,
            },
            title: p.title,
            description: p.description,
            product_type: p.product_type,
            condition: p.condition,
            status: p.status,
            price: p.price,
            stock: p.stock,
            brand: p.brand,
            color: p.color,
            size: p.size,
            city: p.city,
            state: p.state,
            views: p.views,
            favorites_count: p.favorites_count,
            expires_at: p.expires_at.map(|t| t.to_rfc3339()),
            created_at: p.created_at.to_rfc3339(),
            images: d.images.into_iter().map(ImageResponse::from).collect(),
        }
    }
}

fn validated_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::Empty { field: "title" });
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title",
            max: MAX_TITLE_LEN,
        });
    }
    Ok(title.to_string())
}

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "id",
            reason: "invalid UUID format",
        })
    })
}

fn client_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (ip, user_agent)
}

/// GET /products - search the catalog
async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<Paginated<ProductSummaryResponse>>, ApiError> {
    let (filter, page) = params.try_into_filter()?;
    let result = ProductRepo::new(&state.pool).search(&filter, page).await?;
    Ok(Json(result.map(ProductSummaryResponse::from)))
}

/// POST /products - create a listing
async fn create_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product_type = match req.product_type.as_deref() {
        Some(raw) => raw.parse::<ProductType>()?,
        None => ProductType::default(),
    };
    let stock = req.stock.unwrap_or(1);
    if stock < 0 {
        return Err(ValidationError::Negative { field: "stock" }.into());
    }

    let new = NewProduct {
        seller_id: user_id,
        category_id: req.category_id,
        title: validated_title(&req.title)?,
        description: req.description.unwrap_or_default(),
        product_type,
        condition: req.condition.parse::<ProductCondition>()?,
        price: Price::new(req.price)?,
        stock,
        brand: req.brand,
        color: req.color,
        size: req.size,
        city: req.city,
        state: req.state,
        expires_at: req.expires_at,
    };

    let product = ProductRepo::new(&state.pool).create(new).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// GET /products/{id} - product page; counts a view for non-sellers
async fn get_product(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    ValidUuid(id): ValidUuid,
    headers: HeaderMap,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let repo = ProductRepo::new(&state.pool);
    let mut detail = repo.get_detail(id).await?;

    if viewer != Some(detail.product.seller_id) {
        let (ip, user_agent) = client_meta(&headers);
        detail.product.views = repo.record_view(id, viewer, ip, user_agent).await?;
    }

    Ok(Json(ProductDetailResponse::from(detail)))
}

/// PUT /products/{id} - update a listing (seller only)
async fn update_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let title = req.title.as_deref().map(validated_title).transpose()?;
    let price = req.price.map(Price::new).transpose()?;
    if let Some(stock) = req.stock {
        if stock < 0 {
            return Err(ValidationError::Negative { field: "stock" }.into());
        }
    }

    let changes = ProductChanges {
        title,
        description: req.description,
        category_id: req.category_id,
        product_type: req
            .product_type
            .as_deref()
            .map(str::parse::<ProductType>)
            .transpose()?,
        condition: req
            .condition
            .as_deref()
            .map(str::parse::<ProductCondition>)
            .transpose()?,
        status: req
            .status
            .as_deref()
            .map(str::parse::<ProductStatus>)
            .transpose()?,
        price,
        stock: req.stock,
        brand: req.brand,
        color: req.color,
        size: req.size,
        city: req.city,
        state: req.state,
    };

    let product = ProductRepo::new(&state.pool)
        .update(id, user_id, changes)
        .await?;
    Ok(Json(ProductResponse::from(product)))
}

/// DELETE /products/{id} - deactivate a listing (seller only)
async fn delete_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    ProductRepo::new(&state.pool).deactivate(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /products/mine - the seller's own listings, every status
async fn my_products(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ProductSummaryResponse>>, ApiError> {
    let page = Pagination::from(params);
    let result = ProductRepo::new(&state.pool)
        .list_for_seller(user_id, page)
        .await?;
    Ok(Json(result.map(ProductSummaryResponse::from)))
}

/// GET /products/featured - most viewed available products
async fn featured_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductSummaryResponse>>, ApiError> {
    let items = ProductRepo::new(&state.pool).featured().await?;
    Ok(Json(
        items.into_iter().map(ProductSummaryResponse::from).collect(),
    ))
}

/// GET /products/{id}/similar - same category, nearby price
async fn similar_products(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Vec<ProductSummaryResponse>>, ApiError> {
    let items = ProductRepo::new(&state.pool).similar(id).await?;
    Ok(Json(
        items.into_iter().map(ProductSummaryResponse::from).collect(),
    ))
}

/// POST /products/{id}/images - attach an image (seller only)
async fn add_product_image(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<AddImageRequest>,
) -> Result<(StatusCode, Json<ImageResponse>), ApiError> {
    if req.image_path.trim().is_empty() {
        return Err(ValidationError::Empty {
            field: "image_path",
        }
        .into());
    }

    let image = ProductRepo::new(&state.pool)
        .add_image(
            id,
            user_id,
            req.image_path,
            req.alt_text,
            req.is_primary.unwrap_or(false),
            req.position.unwrap_or(0),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ImageResponse::from(image))))
}

/// DELETE /products/{id}/images/{image_id} - remove an image (seller only)
async fn delete_product_image(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let product_id = parse_uuid(&id)?;
    let image_id = parse_uuid(&image_id)?;

    ProductRepo::new(&state.pool)
        .delete_image(product_id, image_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Product routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/featured", get(featured_products))
        .route("/products/mine", get(my_products))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/similar", get(similar_products))
        .route("/products/{id}/images", post(add_product_image))
        .route(
            "/products/{id}/images/{image_id}",
            axum::routing::delete(delete_product_image),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_validation() {
        assert!(validated_title("  ").is_err());
        assert_eq!(validated_title(" Gel kit ").unwrap(), "Gel kit");
        assert!(validated_title(&"x".repeat(201)).is_err());
    }

    #[test]
    fn filter_parses_typed_params() {
        let params = ListProductsParams {
            product_type: Some("both".into()),
            condition: Some("like_new".into()),
            order: Some("price_desc".into()),
            min_price: Some("5.00".parse().unwrap()),
            ..Default::default()
        };
        let (filter, page) = params.try_into_filter().unwrap();
        assert_eq!(filter.product_type, Some(ProductType::Both));
        assert_eq!(filter.condition, Some(ProductCondition::LikeNew));
        assert_eq!(filter.order, ProductOrder::PriceDesc);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn filter_rejects_unknown_order() {
        let params = ListProductsParams {
            order: Some("cheapest".into()),
            ..Default::default()
        };
        assert!(params.try_into_filter().is_err());
    }

    #[test]
    fn client_meta_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.1.2.3, 172.16.0.9".parse().unwrap());
        headers.insert(USER_AGENT, "test-agent".parse().unwrap());

        let (ip, agent) = client_meta(&headers);
        assert_eq!(ip.as_deref(), Some("10.1.2.3"));
        assert_eq!(agent.as_deref(), Some("test-agent"));
    }
}
