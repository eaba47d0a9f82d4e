//! Product repository
//!
//! Listings come back as `ProductSummary` rows with seller, category and
//! primary image resolved in the query itself. `search` builds its WHERE
//! clause dynamically with `QueryBuilder` and carries the result count in
//! the same query via `COUNT(*) OVER()`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use lacquer_core::models::{
    Paginated, Pagination, Price, ProductCondition, ProductStatus, ProductType, ValidationError,
};

use super::DbError;

/// Full product record from database
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category_id: Uuid,
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
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: product plus the joined seller/category names and the
/// primary image, everything a card in a grid needs.
#[derive(Debug, Clone, FromRow)]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub product_type: String,
    pub condition: String,
    pub status: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub views: i32,
    pub favorites_count: i32,
    pub created_at: DateTime<Utc>,
    pub seller_id: Uuid,
    pub seller_username: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_slug: String,
    pub primary_image: Option<String>,
}

/// Product image record
#[derive(Debug, Clone, FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_path: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Product with seller, category and all images for the detail page
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub seller_username: String,
    pub category_name: String,
    pub category_slug: String,
    pub images: Vec<ProductImage>,
}

/// Validated input for creating a product
pub struct NewProduct {
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub product_type: ProductType,
    pub condition: ProductCondition,
    pub price: Price,
    pub stock: i32,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial product update; None leaves the stored value untouched
#[derive(Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_type: Option<ProductType>,
    pub condition: Option<ProductCondition>,
    pub status: Option<ProductStatus>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Search filter for product listings. `status` defaults to available,
/// so the public catalog never leaks sold or inactive listings.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_slug: Option<String>,
    pub seller_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
    pub product_type: Option<ProductType>,
    pub condition: Option<ProductCondition>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub order: ProductOrder,
}

/// Sort order for product listings
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProductOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    MostViewed,
    Title,
}

impl ProductOrder {
    pub fn from_param(s: &str) -> Result<Self, ValidationError> {
        match s {
            "newest" => Ok(Self::Newest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "most_viewed" => Ok(Self::MostViewed),
            "title" => Ok(Self::Title),
            other => Err(ValidationError::InvalidVariant {
                field: "order",
                value: other.to_string(),
            }),
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC",
            Self::PriceAsc => "p.price ASC",
            Self::PriceDesc => "p.price DESC",
            Self::MostViewed => "p.views DESC",
            Self::Title => "p.title ASC",
        }
    }
}

const PRODUCT_COLS: &str = "id, seller_id, category_id, title, description, product_type, \
     condition, status, price, stock, brand, color, size, city, state, views, favorites_count, \
     expires_at, created_at, updated_at";

const SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.title, p.price, p.product_type, p.condition, p.status,
           p.city, p.state, p.views, p.favorites_count, p.created_at,
           p.seller_id, u.username AS seller_username,
           p.category_id, c.name AS category_name, c.slug AS category_slug,
           (SELECT pi.image_path FROM product_images pi
            WHERE pi.product_id = p.id
            ORDER BY pi.is_primary DESC, pi.position, pi.created_at
            LIMIT 1) AS primary_image"#;

const SUMMARY_FROM: &str = r#"
    FROM products p
    JOIN users u ON u.id = p.seller_id
    JOIN categories c ON c.id = p.category_id"#;

/// Product repository
pub struct ProductRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a product listing.
    pub async fn create(&self, new: NewProduct) -> Result<Product, DbError> {
        self.require_category(new.category_id).await?;

        let product: Product = sqlx::query_as(&format!(
            r#"
            INSERT INTO products
                (seller_id, category_id, title, description, product_type, condition,
                 price, stock, brand, color, size, city, state, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            PRODUCT_COLS
        ))
        .bind(new.seller_id)
        .bind(new.category_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.product_type.as_str())
        .bind(new.condition.as_str())
        .bind(new.price.amount())
        .bind(new.stock)
        .bind(new.brand)
        .bind(new.color)
        .bind(new.size)
        .bind(new.city)
        .bind(new.state)
        .bind(new.expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if super::is_foreign_key_violation(&e) {
                DbError::NotFound {
                    resource: "user",
                    id: new.seller_id.to_string(),
                }
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(product)
    }

    /// Get a single product by ID.
    pub async fn get(&self, id: Uuid) -> Result<Product, DbError> {
        let product: Product = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "product",
            id: id.to_string(),
        })?;

        Ok(product)
    }

    /// Get a product with seller, category and images.
    pub async fn get_detail(&self, id: Uuid) -> Result<ProductDetail, DbError> {
        let row = sqlx::query(
            r#"
            SELECT p.*, u.username AS seller_username,
                   c.name AS category_name, c.slug AS category_slug
            FROM products p
            JOIN users u ON u.id = p.seller_id
            JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "product",
            id: id.to_string(),
        })?;

        let product = Product::from_row(&row)?;
        let seller_username: String = row.get("seller_username");
        let category_name: String = row.get("category_name");
        let category_slug: String = row.get("category_slug");

        let images = self.images(id).await?;

        Ok(ProductDetail {
            product,
            seller_username,
            category_name,
            category_slug,
            images,
        })
    }

    /// Record a view: append an event row and bump the counter in one
    /// transaction. Returns the new view count. The caller decides whether
    /// a view counts (sellers browsing their own listing do not).
    pub async fn record_view(
        &self,
        id: Uuid,
        viewer_id: Option<Uuid>,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Result<i32, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO product_view_events (product_id, viewer_id, ip, user_agent)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(viewer_id)
        .bind(ip)
        .bind(user_agent)
        .execute(&mut *tx)
        .await?;

        let (views,): (i32,) =
            sqlx::query_as("UPDATE products SET views = views + 1 WHERE id = $1 RETURNING views")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::NotFound {
                    resource: "product",
                    id: id.to_string(),
                })?;

        tx.commit().await?;
        Ok(views)
    }

    /// Update a product. Only the seller may change their listing.
    pub async fn update(
        &self,
        id: Uuid,
        actor: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, DbError> {
        self.require_owner(id, actor).await?;
        if let Some(category_id) = changes.category_id {
            self.require_category(category_id).await?;
        }

        let product: Product = sqlx::query_as(&format!(
            r#"
            UPDATE products
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category_id = COALESCE($4, category_id),
                product_type = COALESCE($5, product_type),
                condition = COALESCE($6, condition),
                status = COALESCE($7, status),
                price = COALESCE($8, price),
                stock = COALESCE($9, stock),
                brand = COALESCE($10, brand),
                color = COALESCE($11, color),
                size = COALESCE($12, size),
                city = COALESCE($13, city),
                state = COALESCE($14, state),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLS
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.category_id)
        .bind(changes.product_type.map(|t| t.as_str()))
        .bind(changes.condition.map(|c| c.as_str()))
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.price.map(|p| p.amount()))
        .bind(changes.stock)
        .bind(changes.brand)
        .bind(changes.color)
        .bind(changes.size)
        .bind(changes.city)
        .bind(changes.state)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Soft delete: the row stays for carts and exchange history, the
    /// listing just stops being available.
    pub async fn deactivate(&self, id: Uuid, actor: Uuid) -> Result<(), DbError> {
        self.require_owner(id, actor).await?;

        sqlx::query("UPDATE products SET status = 'inactive', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Search the catalog with optional filters, paginated.
    pub async fn search(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Paginated<ProductSummary>, DbError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "{}, COUNT(*) OVER() AS total {} WHERE p.status = ",
            SUMMARY_SELECT, SUMMARY_FROM
        ));
        qb.push_bind(filter.status.unwrap_or(ProductStatus::Available).as_str());

        if let Some(id) = filter.category_id {
            qb.push(" AND p.category_id = ");
            qb.push_bind(id);
        }
        if let Some(slug) = &filter.category_slug {
            qb.push(" AND c.slug = ");
            qb.push_bind(slug.as_str());
        }
        if let Some(id) = filter.seller_id {
            qb.push(" AND p.seller_id = ");
            qb.push_bind(id);
        }
        if let Some(t) = filter.product_type {
            qb.push(" AND p.product_type = ");
            qb.push_bind(t.as_str());
        }
        if let Some(c) = filter.condition {
            qb.push(" AND p.condition = ");
            qb.push_bind(c.as_str());
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND p.price >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND p.price <= ");
            qb.push_bind(max);
        }
        if let Some(city) = &filter.city {
            qb.push(" AND p.city ILIKE ");
            qb.push_bind(format!("%{}%", city));
        }
        if let Some(state) = &filter.state {
            qb.push(" AND p.state ILIKE ");
            qb.push_bind(format!("%{}%", state));
        }
        if let Some(brand) = &filter.brand {
            qb.push(" AND p.brand ILIKE ");
            qb.push_bind(format!("%{}%", brand));
        }
        if let Some(color) = &filter.color {
            qb.push(" AND p.color ILIKE ");
            qb.push_bind(format!("%{}%", color));
        }
        if let Some(q) = &filter.q {
            let pattern = format!("%{}%", q);
            qb.push(" AND (p.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.description ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.brand ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY ");
        qb.push(filter.order.sql());
        qb.push(" LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb.build().fetch_all(self.pool).await?;
        let total = rows
            .first()
            .map(|row| row.get::<i64, _>("total"))
            .unwrap_or(0);
        let items = rows
            .iter()
            .map(ProductSummary::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated::new(items, total, page))
    }

    /// All listings for one seller, every status, newest first.
    pub async fn list_for_seller(
        &self,
        seller_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<ProductSummary>, DbError> {
        let rows = sqlx::query(&format!(
            r#"{}, COUNT(*) OVER() AS total {}
            WHERE p.seller_id = $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3"#,
            SUMMARY_SELECT, SUMMARY_FROM
        ))
        .bind(seller_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = rows
            .first()
            .map(|row| row.get::<i64, _>("total"))
            .unwrap_or(0);
        let items = rows
            .iter()
            .map(ProductSummary::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated::new(items, total, page))
    }

    /// Available products in the same category within a +/-30% price band,
    /// best-viewed first.
    pub async fn similar(&self, id: Uuid) -> Result<Vec<ProductSummary>, DbError> {
        let product = self.get(id).await?;
        let low = product.price * Decimal::new(7, 1);
        let high = product.price * Decimal::new(13, 1);

        let items: Vec<ProductSummary> = sqlx::query_as(&format!(
            r#"{} {}
            WHERE p.category_id = $1
              AND p.status = 'available'
              AND p.id <> $2
              AND p.price BETWEEN $3 AND $4
            ORDER BY p.views DESC
            LIMIT 6"#,
            SUMMARY_SELECT, SUMMARY_FROM
        ))
        .bind(product.category_id)
        .bind(id)
        .bind(low)
        .bind(high)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Most viewed available products for the landing page.
    pub async fn featured(&self) -> Result<Vec<ProductSummary>, DbError> {
        let items: Vec<ProductSummary> = sqlx::query_as(&format!(
            r#"{} {}
            WHERE p.status = 'available'
            ORDER BY p.views DESC
            LIMIT 10"#,
            SUMMARY_SELECT, SUMMARY_FROM
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Images for a product, primary first.
    pub async fn images(&self, product_id: Uuid) -> Result<Vec<ProductImage>, DbError> {
        let images: Vec<ProductImage> = sqlx::query_as(
            r#"
            SELECT id, product_id, image_path, alt_text, is_primary, position, created_at
            FROM product_images
            WHERE product_id = $1
            ORDER BY is_primary DESC, position, created_at
            "#,
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(images)
    }

    /// Attach an image. A primary image demotes any existing primary in
    /// the same transaction, keeping at most one per product.
    pub async fn add_image(
        &self,
        product_id: Uuid,
        actor: Uuid,
        image_path: String,
        alt_text: Option<String>,
        is_primary: bool,
        position: i32,
    ) -> Result<ProductImage, DbError> {
        self.require_owner(product_id, actor).await?;

        let mut tx = self.pool.begin().await?;

        if is_primary {
            sqlx::query(
                "UPDATE product_images SET is_primary = FALSE WHERE product_id = $1 AND is_primary",
            )
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        let image: ProductImage = sqlx::query_as(
            r#"
            INSERT INTO product_images (product_id, image_path, alt_text, is_primary, position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, image_path, alt_text, is_primary, position, created_at
            "#,
        )
        .bind(product_id)
        .bind(image_path)
        .bind(alt_text)
        .bind(is_primary)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(image)
    }

    /// Remove an image from a product the actor owns.
    pub async fn delete_image(
        &self,
        product_id: Uuid,
        image_id: Uuid,
        actor: Uuid,
    ) -> Result<(), DbError> {
        self.require_owner(product_id, actor).await?;

        let result = sqlx::query("DELETE FROM product_images WHERE id = $1 AND product_id = $2")
            .bind(image_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "image",
                id: image_id.to_string(),
            });
        }
        Ok(())
    }

    async fn require_owner(&self, id: Uuid, actor: Uuid) -> Result<(), DbError> {
        let seller: Option<(Uuid,)> =
            sqlx::query_as("SELECT seller_id FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        match seller {
            None => Err(DbError::NotFound {
                resource: "product",
                id: id.to_string(),
            }),
            Some((seller_id,)) if seller_id != actor => Err(DbError::Forbidden {
                reason: "only the seller can modify this product",
            }),
            Some(_) => Ok(()),
        }
    }

    async fn require_category(&self, id: Uuid) -> Result<(), DbError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND is_active)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        if !exists {
            return Err(DbError::NotFound {
                resource: "category",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil;

    fn new_product(seller_id: Uuid, category_id: Uuid, title: &str, price: &str) -> NewProduct {
        NewProduct {
            seller_id,
            category_id,
            title: title.to_string(),
            description: String::new(),
            product_type: ProductType::Sale,
            condition: ProductCondition::New,
            price: Price::new(price.parse().unwrap()).unwrap(),
            stock: 3,
            brand: Some("OPI".into()),
            color: None,
            size: None,
            city: None,
            state: None,
            expires_at: None,
        }
    }

    #[test]
    fn order_param_round_trip() {
        assert_eq!(
            ProductOrder::from_param("price_asc").unwrap(),
            ProductOrder::PriceAsc
        );
        assert!(ProductOrder::from_param("cheapest").is_err());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_then_get_detail() {
        let pool = testutil::pool().await;
        let repo = ProductRepo::new(&pool);
        let seller = testutil::seed_user(&pool).await;
        let category = testutil::seed_category(&pool).await;

        let product = repo
            .create(new_product(seller, category, "Red lacquer", "12.50"))
            .await
            .unwrap();
        assert_eq!(product.status, "available");
        assert_eq!(product.views, 0);
        assert_eq!(product.favorites_count, 0);

        let detail = repo.get_detail(product.id).await.unwrap();
        assert_eq!(detail.product.id, product.id);
        assert!(detail.images.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_by_non_owner_is_forbidden() {
        let pool = testutil::pool().await;
        let repo = ProductRepo::new(&pool);
        let seller = testutil::seed_user(&pool).await;
        let stranger = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "10.00", 1).await;

        let changes = ProductChanges {
            title: Some("Hijacked".into()),
            ..Default::default()
        };
        let err = repo.update(product_id, stranger, changes).await.unwrap_err();
        assert!(matches!(err, DbError::Forbidden { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn deactivate_hides_from_search() {
        let pool = testutil::pool().await;
        let repo = ProductRepo::new(&pool);
        let seller = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "10.00", 1).await;

        repo.deactivate(product_id, seller).await.unwrap();

        let product = repo.get(product_id).await.unwrap();
        assert_eq!(product.status, "inactive");

        let filter = ProductFilter {
            seller_id: Some(seller),
            ..Default::default()
        };
        let page = repo.search(&filter, Pagination::default()).await.unwrap();
        assert!(page.items.iter().all(|p| p.id != product_id));

        // Still visible to the seller's own listing view
        let mine = repo
            .list_for_seller(seller, Pagination::default())
            .await
            .unwrap();
        assert!(mine.items.iter().any(|p| p.id == product_id));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn record_view_appends_event_and_increments() {
        let pool = testutil::pool().await;
        let repo = ProductRepo::new(&pool);
        let seller = testutil::seed_user(&pool).await;
        let viewer = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "10.00", 1).await;

        let views = repo
            .record_view(product_id, Some(viewer), None, Some("test-agent".into()))
            .await
            .unwrap();
        assert_eq!(views, 1);

        let (events,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_view_events WHERE product_id = $1")
                .bind(product_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(events, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn primary_image_stays_unique() {
        let pool = testutil::pool().await;
        let repo = ProductRepo::new(&pool);
        let seller = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "10.00", 1).await;

        repo.add_image(product_id, seller, "a.jpg".into(), None, true, 0)
            .await
            .unwrap();
        let second = repo
            .add_image(product_id, seller, "b.jpg".into(), None, true, 1)
            .await
            .unwrap();

        let images = repo.images(product_id).await.unwrap();
        assert_eq!(images.len(), 2);
        let primaries: Vec<_> = images.iter().filter(|i| i.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, second.id);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn search_filters_by_text_and_price() {
        let pool = testutil::pool().await;
        let repo = ProductRepo::new(&pool);
        let seller = testutil::seed_user(&pool).await;
        let category = testutil::seed_category(&pool).await;

        let tag = Uuid::new_v4().simple().to_string();
        let cheap = repo
            .create(new_product(
                seller,
                category,
                &format!("Budget topcoat {}", tag),
                "5.00",
            ))
            .await
            .unwrap();
        let pricey = repo
            .create(new_product(
                seller,
                category,
                &format!("Salon topcoat {}", tag),
                "50.00",
            ))
            .await
            .unwrap();

        let filter = ProductFilter {
            q: Some(format!("topcoat {}", tag)),
            min_price: Some("10.00".parse().unwrap()),
            order: ProductOrder::PriceAsc,
            ..Default::default()
        };
        let page = repo.search(&filter, Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, pricey.id);
        assert!(page.items.iter().all(|p| p.id != cheap.id));
    }
}
