//! Derived-counter refresh functions
//!
//! Every denormalized column is recomputed here and nowhere else:
//! `products.favorites_count`, `carts.total`, and the reputation
//! aggregates. The per-row refreshes take `&mut PgConnection` so they
//! run inside the caller's transaction: the triggering write and the
//! counter update commit or roll back together. No retries, no hooks.
//!
//! `recount_all` is the offline sweep for drift repair (CLI `recount`).

use lacquer_core::counters;
use lacquer_core::models::{Rating, ReviewPolarity};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repos::DbError;

/// Recompute `products.favorites_count` from the favorites table.
///
/// Returns the new count.
pub async fn refresh_favorites_count(
    conn: &mut PgConnection,
    product_id: Uuid,
) -> Result<i32, DbError> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE products
        SET favorites_count = (SELECT COUNT(*) FROM favorites WHERE product_id = $1),
            updated_at = NOW()
        WHERE id = $1
        RETURNING favorites_count
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|(n,)| n).ok_or_else(|| DbError::NotFound {
        resource: "product",
        id: product_id.to_string(),
    })
}

/// Recompute `carts.total` from current item quantities and current
/// product prices.
///
/// The price snapshot is always "now": a product price change followed by
/// any cart write re-derives the total from the new price.
pub async fn refresh_cart_total(conn: &mut PgConnection, cart_id: Uuid) -> Result<Decimal, DbError> {
    let lines: Vec<(i32, Decimal)> = sqlx::query_as(
        r#"
        SELECT ci.quantity, p.price
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    let total = counters::cart_total(&lines);

    let row: Option<(Decimal,)> = sqlx::query_as(
        "UPDATE carts SET total = $2, updated_at = NOW() WHERE id = $1 RETURNING total",
    )
    .bind(cart_id)
    .bind(total)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|(t,)| t).ok_or_else(|| DbError::NotFound {
        resource: "cart",
        id: cart_id.to_string(),
    })
}

/// Fold one new review into the reviewed user's reputation: bump the
/// positive or negative counter, then restore the stored average.
///
/// Returns the new average rating.
pub async fn apply_review_to_reputation(
    conn: &mut PgConnection,
    reviewed_id: Uuid,
    rating: &Rating,
) -> Result<Decimal, DbError> {
    let is_positive = rating.polarity() == ReviewPolarity::Positive;

    let (positive, negative): (i32, i32) = sqlx::query_as(
        r#"
        UPDATE reputations
        SET positive_reviews = positive_reviews + CASE WHEN $2 THEN 1 ELSE 0 END,
            negative_reviews = negative_reviews + CASE WHEN $2 THEN 0 ELSE 1 END,
            updated_at = NOW()
        WHERE user_id = $1
        RETURNING positive_reviews, negative_reviews
        "#,
    )
    .bind(reviewed_id)
    .bind(is_positive)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::NotFound {
        resource: "reputation",
        id: reviewed_id.to_string(),
    })?;

    let average = counters::average_rating(positive as i64, negative as i64);

    sqlx::query("UPDATE reputations SET average_rating = $2 WHERE user_id = $1")
        .bind(reviewed_id)
        .bind(average)
        .execute(&mut *conn)
        .await?;

    Ok(average)
}

/// What the drift-repair sweep touched.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecountReport {
    pub products_corrected: u64,
    pub carts_corrected: u64,
    pub reputation_counts_corrected: u64,
    pub reputation_averages_corrected: u64,
}

impl RecountReport {
    pub fn total(&self) -> u64 {
        self.products_corrected
            + self.carts_corrected
            + self.reputation_counts_corrected
            + self.reputation_averages_corrected
    }
}

/// Full sweep: recompute every derived column and fix rows that drifted.
///
/// Intended for maintenance, not the request path; each statement only
/// rewrites rows whose stored value differs from the recomputed one.
pub async fn recount_all(pool: &PgPool) -> Result<RecountReport, DbError> {
    let mut report = RecountReport::default();

    report.products_corrected = sqlx::query(
        r#"
        UPDATE products p
        SET favorites_count = sub.n, updated_at = NOW()
        FROM (
            SELECT p2.id, COALESCE(f.n, 0) AS n
            FROM products p2
            LEFT JOIN (
                SELECT product_id, COUNT(*) AS n FROM favorites GROUP BY product_id
            ) f ON f.product_id = p2.id
        ) sub
        WHERE p.id = sub.id AND p.favorites_count <> sub.n
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    report.carts_corrected = sqlx::query(
        r#"
        UPDATE carts c
        SET total = sub.t, updated_at = NOW()
        FROM (
            SELECT c2.id, COALESCE(SUM(ci.quantity * p.price), 0) AS t
            FROM carts c2
            LEFT JOIN cart_items ci ON ci.cart_id = c2.id
            LEFT JOIN products p ON p.id = ci.product_id
            GROUP BY c2.id
        ) sub
        WHERE c.id = sub.id AND c.total <> sub.t
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    report.reputation_counts_corrected = sqlx::query(
        r#"
        UPDATE reputations r
        SET positive_reviews = sub.pos, negative_reviews = sub.neg, updated_at = NOW()
        FROM (
            SELECT u.id AS user_id,
                   COALESCE(COUNT(v.id) FILTER (WHERE v.rating >= 4), 0) AS pos,
                   COALESCE(COUNT(v.id) FILTER (WHERE v.rating < 4), 0) AS neg
            FROM users u
            LEFT JOIN reviews v ON v.reviewed_id = u.id
            GROUP BY u.id
        ) sub
        WHERE r.user_id = sub.user_id
          AND (r.positive_reviews <> sub.pos OR r.negative_reviews <> sub.neg)
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    // Averages re-derive from the (now corrected) counters in Rust so the
    // formula lives in exactly one place.
    let reputations: Vec<(Uuid, i32, i32, Decimal)> = sqlx::query_as(
        "SELECT user_id, positive_reviews, negative_reviews, average_rating FROM reputations",
    )
    .fetch_all(pool)
    .await?;

    for (user_id, positive, negative, stored) in reputations {
        let expected = counters::average_rating(positive as i64, negative as i64);
        if stored != expected {
            sqlx::query(
                "UPDATE reputations SET average_rating = $2, updated_at = NOW() WHERE user_id = $1",
            )
            .bind(user_id)
            .bind(expected)
            .execute(pool)
            .await?;
            report.reputation_averages_corrected += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn cart_total_tracks_items_and_prices() {
        let pool = testutil::pool().await;
        let buyer = testutil::seed_user(&pool).await;
        let seller = testutil::seed_user(&pool).await;
        let product = testutil::seed_product(&pool, seller, "10.00", 5).await;

        let (cart_id,): (Uuid,) =
            sqlx::query_as("INSERT INTO carts (user_id) VALUES ($1) RETURNING id")
                .bind(buyer)
                .fetch_one(&pool)
                .await
                .unwrap();

        sqlx::query("INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, 3)")
            .bind(cart_id)
            .bind(product)
            .execute(&pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let total = refresh_cart_total(&mut conn, cart_id).await.unwrap();
        assert_eq!(total, "30.00".parse().unwrap());

        // Price change re-derives from the new price
        sqlx::query("UPDATE products SET price = 12.50 WHERE id = $1")
            .bind(product)
            .execute(&pool)
            .await
            .unwrap();

        let total = refresh_cart_total(&mut conn, cart_id).await.unwrap();
        assert_eq!(total, "37.50".parse().unwrap());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn recount_repairs_drifted_counters() {
        let pool = testutil::pool().await;
        let user = testutil::seed_user(&pool).await;
        let seller = testutil::seed_user(&pool).await;
        let product = testutil::seed_product(&pool, seller, "5.00", 1).await;

        sqlx::query("INSERT INTO favorites (user_id, product_id) VALUES ($1, $2)")
            .bind(user)
            .bind(product)
            .execute(&pool)
            .await
            .unwrap();

        // Simulate drift: stored counter disagrees with the favorites table
        sqlx::query("UPDATE products SET favorites_count = 99 WHERE id = $1")
            .bind(product)
            .execute(&pool)
            .await
            .unwrap();

        let report = recount_all(&pool).await.unwrap();
        assert!(report.products_corrected >= 1);

        let (count,): (i32,) =
            sqlx::query_as("SELECT favorites_count FROM products WHERE id = $1")
                .bind(product)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }
}
