//! Cart repository
//!
//! One cart per user, created lazily on first touch. `carts.total` is
//! derived from the items at current product prices; every mutation
//! refreshes it in the same transaction, so a price change shows up in
//! the total on the next cart write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use lacquer_core::models::Quantity;

use super::{is_foreign_key_violation, DbError};
use crate::db::counters;

/// Cart record from database
#[derive(Debug, Clone, FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart line with the joined product fields the cart page shows
#[derive(Debug, Clone, FromRow)]
pub struct CartItemDetail {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub stock: i32,
    pub product_status: String,
}

/// Cart with all its lines
#[derive(Debug, Clone)]
pub struct CartDetail {
    pub cart: Cart,
    pub items: Vec<CartItemDetail>,
}

const CART_COLS: &str = "id, user_id, total, created_at, updated_at";

/// Cart repository
pub struct CartRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it on first use.
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<Cart, DbError> {
        let mut tx = self.pool.begin().await?;
        let cart = Self::upsert_cart(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Cart with items joined to their products.
    pub async fn get_detail(&self, user_id: Uuid) -> Result<CartDetail, DbError> {
        let cart = self.get_or_create(user_id).await?;
        let items = self.items(cart.id).await?;
        Ok(CartDetail { cart, items })
    }

    /// Add a product to the cart. If the product is already in the cart
    /// the quantities are added together; the unique (cart_id, product_id)
    /// index and ON CONFLICT make this safe under concurrent requests.
    ///
    /// The stock check is advisory: it catches obvious over-asks but two
    /// concurrent adds can still both pass it. Stock is only committed at
    /// checkout, which is out of scope here.
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartDetail, DbError> {
        let mut tx = self.pool.begin().await?;
        let cart = Self::upsert_cart(&mut tx, user_id).await?;

        let product: Option<(i32, String)> =
            sqlx::query_as("SELECT stock, status FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (stock, status) = product.ok_or_else(|| DbError::NotFound {
            resource: "product",
            id: product_id.to_string(),
        })?;

        if status != "available" {
            return Err(DbError::Invalid {
                reason: "product is not available",
            });
        }
        if quantity.get() > stock {
            return Err(DbError::Invalid {
                reason: "insufficient stock for this product",
            });
        }

        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE
                SET quantity = cart_items.quantity + EXCLUDED.quantity,
                    updated_at = NOW()
            "#,
        )
        .bind(cart.id)
        .bind(product_id)
        .bind(quantity.get())
        .execute(&mut *tx)
        .await?;

        counters::refresh_cart_total(&mut tx, cart.id).await?;
        tx.commit().await?;

        self.get_detail(user_id).await
    }

    /// Set an item's quantity. A quantity below one removes the line.
    pub async fn set_item_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartDetail, DbError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT ci.cart_id, ci.product_id
            FROM cart_items ci
            JOIN carts c ON c.id = ci.cart_id
            WHERE ci.id = $1 AND c.user_id = $2
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (cart_id, product_id) = row.ok_or_else(|| DbError::NotFound {
            resource: "cart item",
            id: item_id.to_string(),
        })?;

        if quantity < 1 {
            sqlx::query("DELETE FROM cart_items WHERE id = $1")
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        } else {
            let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_one(&mut *tx)
                .await?;
            if quantity > stock {
                return Err(DbError::Invalid {
                    reason: "insufficient stock for this product",
                });
            }

            sqlx::query("UPDATE cart_items SET quantity = $2, updated_at = NOW() WHERE id = $1")
                .bind(item_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }

        counters::refresh_cart_total(&mut tx, cart_id).await?;
        tx.commit().await?;

        self.get_detail(user_id).await
    }

    /// Remove a single line from the cart.
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<CartDetail, DbError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: Option<(Uuid,)> = sqlx::query_as(
            r#"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
            RETURNING ci.cart_id
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (cart_id,) = cart_id.ok_or_else(|| DbError::NotFound {
            resource: "cart item",
            id: item_id.to_string(),
        })?;

        counters::refresh_cart_total(&mut tx, cart_id).await?;
        tx.commit().await?;

        self.get_detail(user_id).await
    }

    /// Empty the cart and reset its total.
    pub async fn clear(&self, user_id: Uuid) -> Result<CartDetail, DbError> {
        let mut tx = self.pool.begin().await?;
        let cart = Self::upsert_cart(&mut tx, user_id).await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        counters::refresh_cart_total(&mut tx, cart.id).await?;
        tx.commit().await?;

        self.get_detail(user_id).await
    }

    async fn items(&self, cart_id: Uuid) -> Result<Vec<CartItemDetail>, DbError> {
        let items: Vec<CartItemDetail> = sqlx::query_as(
            r#"
            SELECT ci.id, ci.product_id, p.title, p.price AS unit_price, ci.quantity,
                   (ci.quantity * p.price) AS line_total, p.stock, p.status AS product_status
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at
            "#,
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    // DO UPDATE instead of DO NOTHING so RETURNING also fires for the
    // existing row.
    async fn upsert_cart(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<Cart, DbError> {
        let cart: Cart = sqlx::query_as(&format!(
            r#"
            INSERT INTO carts (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {}
            "#,
            CART_COLS
        ))
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::NotFound {
                    resource: "user",
                    id: user_id.to_string(),
                }
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn adding_same_product_twice_merges_quantities() {
        let pool = testutil::pool().await;
        let repo = CartRepo::new(&pool);
        let buyer = testutil::seed_user(&pool).await;
        let seller = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "10.00", 10).await;

        repo.add_item(buyer, product_id, Quantity::new(2).unwrap())
            .await
            .unwrap();
        let detail = repo
            .add_item(buyer, product_id, Quantity::new(3).unwrap())
            .await
            .unwrap();

        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].quantity, 5);
        assert_eq!(detail.cart.total, "50.00".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn quantity_below_one_removes_the_line() {
        let pool = testutil::pool().await;
        let repo = CartRepo::new(&pool);
        let buyer = testutil::seed_user(&pool).await;
        let seller = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "8.00", 5).await;

        let detail = repo
            .add_item(buyer, product_id, Quantity::new(2).unwrap())
            .await
            .unwrap();
        let item_id = detail.items[0].id;

        let detail = repo.set_item_quantity(buyer, item_id, 0).await.unwrap();
        assert!(detail.items.is_empty());
        assert_eq!(detail.cart.total, Decimal::ZERO);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn total_follows_price_changes() {
        let pool = testutil::pool().await;
        let repo = CartRepo::new(&pool);
        let buyer = testutil::seed_user(&pool).await;
        let seller = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "10.00", 10).await;

        let detail = repo
            .add_item(buyer, product_id, Quantity::new(3).unwrap())
            .await
            .unwrap();
        assert_eq!(detail.cart.total, "30.00".parse::<Decimal>().unwrap());

        sqlx::query("UPDATE products SET price = 12.50 WHERE id = $1")
            .bind(product_id)
            .execute(&pool)
            .await
            .unwrap();

        // Next mutation reprices the whole cart
        let item_id = detail.items[0].id;
        let detail = repo.set_item_quantity(buyer, item_id, 3).await.unwrap();
        assert_eq!(detail.cart.total, "37.50".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn over_stock_add_is_rejected() {
        let pool = testutil::pool().await;
        let repo = CartRepo::new(&pool);
        let buyer = testutil::seed_user(&pool).await;
        let seller = testutil::seed_user(&pool).await;
        let product_id = testutil::seed_product(&pool, seller, "10.00", 2).await;

        let err = repo
            .add_item(buyer, product_id, Quantity::new(3).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid { .. }));

        let detail = repo.get_detail(buyer).await.unwrap();
        assert!(detail.items.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn clear_resets_total() {
        let pool = testutil::pool().await;
        let repo = CartRepo::new(&pool);
        let buyer = testutil::seed_user(&pool).await;
        let seller = testutil::seed_user(&pool).await;
        let a = testutil::seed_product(&pool, seller, "5.00", 5).await;
        let b = testutil::seed_product(&pool, seller, "7.00", 5).await;

        repo.add_item(buyer, a, Quantity::new(1).unwrap())
            .await
            .unwrap();
        repo.add_item(buyer, b, Quantity::new(2).unwrap())
            .await
            .unwrap();

        let detail = repo.clear(buyer).await.unwrap();
        assert!(detail.items.is_empty());
        assert_eq!(detail.cart.total, Decimal::ZERO);
    }
}
