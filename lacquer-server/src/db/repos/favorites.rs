//! Favorites repository
//!
//! Favoriting is a toggle: one call adds, the next removes. The
//! `products.favorites_count` column is refreshed inside the same
//! transaction as the row change, so it always equals the row count.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use lacquer_core::models::{Paginated, Pagination};

use super::{is_foreign_key_violation, is_unique_violation, DbError};
use crate::db::counters;

/// Outcome of a toggle: the new state and the refreshed counter
#[derive(Debug, Clone, Copy)]
pub struct FavoriteToggle {
    pub favorited: bool,
    pub favorites_count: i32,
}

/// Favorite row joined with the product it points at
#[derive(Debug, Clone, FromRow)]
pub struct FavoriteWithProduct {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub status: String,
    pub primary_image: Option<String>,
    pub favorited_at: DateTime<Utc>,
}

/// Favorites repository
pub struct FavoriteRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Toggle a favorite. Sellers cannot favorite their own listings.
    pub async fn toggle(&self, user_id: Uuid, product_id: Uuid) -> Result<FavoriteToggle, DbError> {
        let mut tx = self.pool.begin().await?;

        let seller: Option<(Uuid,)> =
            sqlx::query_as("SELECT seller_id FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (seller_id,) = seller.ok_or_else(|| DbError::NotFound {
            resource: "product",
            id: product_id.to_string(),
        })?;
        if seller_id == user_id {
            return Err(DbError::Invalid {
                reason: "cannot favorite your own product",
            });
        }

        let deleted = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let favorited = deleted == 0;
        if favorited {
            sqlx::query("INSERT INTO favorites (user_id, product_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        DbError::Conflict {
                            resource: "favorite",
                            detail: "already exists",
                        }
                    } else if is_foreign_key_violation(&e) {
                        DbError::NotFound {
                            resource: "user",
                            id: user_id.to_string(),
                        }
                    } else {
                        DbError::Sqlx(e)
                    }
                })?;
        }

        let favorites_count = counters::refresh_favorites_count(&mut tx, product_id).await?;
        tx.commit().await?;

        Ok(FavoriteToggle {
            favorited,
            favorites_count,
        })
    }

    /// User's favorites, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<FavoriteWithProduct>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT f.id, f.product_id, p.title, p.price, p.status,
                   (SELECT pi.image_path FROM product_images pi
                    WHERE pi.product_id = p.id
                    ORDER BY pi.is_primary DESC, pi.position, pi.created_at
                    LIMIT 1) AS primary_image,
                   f.created_at AS favorited_at,
                   COUNT(*) OVER() AS total
            FROM favorites f
            JOIN products p ON p.id = f.product_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
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
            .map(FavoriteWithProduct::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated::new(items, total, page))
    }
}
