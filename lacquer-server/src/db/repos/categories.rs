//! Category repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use lacquer_core::models::Slug;

use super::DbError;

/// Category record from database
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Category with its count of available products
#[derive(Debug, Clone, FromRow)]
pub struct CategoryWithCount {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub product_count: i64,
}

/// Category repository
pub struct CategoryRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a category, or refresh name/description if the slug exists.
    ///
    /// The upsert keeps seeding idempotent: re-running `lacquer seed`
    /// updates wording without duplicating rows.
    pub async fn create(
        &self,
        name: &str,
        slug: &Slug,
        description: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Category, DbError> {
        let category: Category = sqlx::query_as(
            r#"
            INSERT INTO categories (name, slug, description, icon)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE
                SET name = EXCLUDED.name,
                    description = COALESCE(EXCLUDED.description, categories.description),
                    icon = COALESCE(EXCLUDED.icon, categories.icon)
            RETURNING id, name, slug, description, icon, is_active, created_at
            "#,
        )
        .bind(name)
        .bind(slug.as_str())
        .bind(description)
        .bind(icon)
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }

    /// List active categories with available-product counts.
    pub async fn list_active(&self) -> Result<Vec<CategoryWithCount>, DbError> {
        let categories: Vec<CategoryWithCount> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.icon,
                   COUNT(p.id) FILTER (WHERE p.status = 'available') AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            WHERE c.is_active
            GROUP BY c.id, c.name, c.slug, c.description, c.icon
            ORDER BY c.name
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Look up an active category by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryWithCount, DbError> {
        let category: CategoryWithCount = sqlx::query_as(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.icon,
                   COUNT(p.id) FILTER (WHERE p.status = 'available') AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            WHERE c.slug = $1 AND c.is_active
            GROUP BY c.id, c.name, c.slug, c.description, c.icon
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "category",
            id: slug.to_string(),
        })?;

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_is_idempotent_per_slug() {
        let pool = testutil::pool().await;
        let repo = CategoryRepo::new(&pool);

        let tag = Uuid::new_v4().simple().to_string();
        let slug = Slug::new(&format!("gel-{}", tag)).unwrap();

        let first = repo
            .create(&format!("Gel {}", tag), &slug, Some("old wording"), None)
            .await
            .unwrap();
        let second = repo
            .create(&format!("Gel {}", tag), &slug, Some("new wording"), None)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.description.as_deref(), Some("new wording"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn counts_only_available_products() {
        let pool = testutil::pool().await;
        let repo = CategoryRepo::new(&pool);

        let seller = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "10.00", 1).await;

        let (slug,): (String,) = sqlx::query_as(
            "SELECT c.slug FROM categories c JOIN products p ON p.category_id = c.id WHERE p.id = $1",
        )
        .bind(product_id)
        .fetch_one(&pool)
        .await
        .unwrap();

        let category = repo.get_by_slug(&slug).await.unwrap();
        assert_eq!(category.product_count, 1);

        sqlx::query("UPDATE products SET status = 'sold' WHERE id = $1")
            .bind(product_id)
            .execute(&pool)
            .await
            .unwrap();

        let category = repo.get_by_slug(&slug).await.unwrap();
        assert_eq!(category.product_count, 0);
    }
}
