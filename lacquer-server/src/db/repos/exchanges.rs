//! Exchange request repository
//!
//! An exchange offers one of the requester's products for one of the
//! owner's. Creation enforces the three ownership/type rules; thereafter
//! the request walks a small state machine: pending -> accepted ->
//! completed, with rejected (owner) and cancelled (requester) as exits
//! from pending.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use lacquer_core::models::{ExchangeStatus, Paginated, Pagination, ProductType};

use super::{is_foreign_key_violation, DbError};

/// Exchange request record from database
#[derive(Debug, Clone, FromRow)]
pub struct ExchangeRequest {
    pub id: Uuid,
    pub offered_product_id: Uuid,
    pub requested_product_id: Uuid,
    pub requester_id: Uuid,
    pub owner_id: Uuid,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Exchange with both product titles for list views
#[derive(Debug, Clone, FromRow)]
pub struct ExchangeWithProducts {
    pub id: Uuid,
    pub offered_product_id: Uuid,
    pub offered_title: String,
    pub requested_product_id: Uuid,
    pub requested_title: String,
    pub requester_id: Uuid,
    pub owner_id: Uuid,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const EXCHANGE_COLS: &str = "id, offered_product_id, requested_product_id, requester_id, \
     owner_id, message, status, created_at, updated_at";

const EXCHANGE_SELECT: &str = r#"
    SELECT e.id, e.offered_product_id, o.title AS offered_title,
           e.requested_product_id, r.title AS requested_title,
           e.requester_id, e.owner_id, e.message, e.status,
           e.created_at, e.updated_at"#;

const EXCHANGE_FROM: &str = r#"
    FROM exchange_requests e
    JOIN products o ON o.id = e.offered_product_id
    JOIN products r ON r.id = e.requested_product_id"#;

#[derive(FromRow)]
struct ProductBrief {
    seller_id: Uuid,
    product_type: String,
}

/// Exchange repository
pub struct ExchangeRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ExchangeRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an exchange request.
    ///
    /// Rules: the offered product must belong to the requester, the
    /// requested product must not, and the requested product has to be
    /// listed for exchange (not sale-only). The owner side is derived
    /// from the requested product's seller, never taken from the caller.
    pub async fn create(
        &self,
        requester_id: Uuid,
        offered_product_id: Uuid,
        requested_product_id: Uuid,
        message: Option<String>,
    ) -> Result<ExchangeRequest, DbError> {
        let offered = self.product_brief(offered_product_id).await?;
        let requested = self.product_brief(requested_product_id).await?;

        if offered.seller_id != requester_id {
            return Err(DbError::Forbidden {
                reason: "offered product does not belong to you",
            });
        }
        if requested.seller_id == requester_id {
            return Err(DbError::Invalid {
                reason: "cannot request an exchange for your own product",
            });
        }
        let requested_type = requested
            .product_type
            .parse::<ProductType>()
            .unwrap_or(ProductType::Sale);
        if !requested_type.allows_exchange() {
            return Err(DbError::Invalid {
                reason: "requested product is listed for sale, not exchange",
            });
        }

        let exchange: ExchangeRequest = sqlx::query_as(&format!(
            r#"
            INSERT INTO exchange_requests
                (offered_product_id, requested_product_id, requester_id, owner_id, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            EXCHANGE_COLS
        ))
        .bind(offered_product_id)
        .bind(requested_product_id)
        .bind(requester_id)
        .bind(requested.seller_id)
        .bind(message)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::NotFound {
                    resource: "user",
                    id: requester_id.to_string(),
                }
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(exchange)
    }

    /// Fetch a single exchange; only its participants may see it.
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<ExchangeWithProducts, DbError> {
        let exchange: ExchangeWithProducts = sqlx::query_as(&format!(
            "{} {} WHERE e.id = $1",
            EXCHANGE_SELECT, EXCHANGE_FROM
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "exchange",
            id: id.to_string(),
        })?;

        if exchange.requester_id != user_id && exchange.owner_id != user_id {
            return Err(DbError::Forbidden {
                reason: "not a participant in this exchange",
            });
        }
        Ok(exchange)
    }

    /// Exchanges the user has sent, newest first.
    pub async fn list_sent(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<ExchangeWithProducts>, DbError> {
        self.list_by("e.requester_id", user_id, page).await
    }

    /// Exchanges aimed at the user's products, newest first.
    pub async fn list_received(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<ExchangeWithProducts>, DbError> {
        self.list_by("e.owner_id", user_id, page).await
    }

    /// Owner accepts a pending exchange.
    pub async fn accept(&self, id: Uuid, actor: Uuid) -> Result<ExchangeRequest, DbError> {
        self.transition(id, actor, ExchangeStatus::Accepted).await
    }

    /// Owner rejects a pending exchange.
    pub async fn reject(&self, id: Uuid, actor: Uuid) -> Result<ExchangeRequest, DbError> {
        self.transition(id, actor, ExchangeStatus::Rejected).await
    }

    /// Requester withdraws a pending exchange.
    pub async fn cancel(&self, id: Uuid, actor: Uuid) -> Result<ExchangeRequest, DbError> {
        self.transition(id, actor, ExchangeStatus::Cancelled).await
    }

    /// Either participant marks an accepted exchange as completed.
    pub async fn complete(&self, id: Uuid, actor: Uuid) -> Result<ExchangeRequest, DbError> {
        self.transition(id, actor, ExchangeStatus::Completed).await
    }

    async fn transition(
        &self,
        id: Uuid,
        actor: Uuid,
        next: ExchangeStatus,
    ) -> Result<ExchangeRequest, DbError> {
        let current: ExchangeRequest = sqlx::query_as(&format!(
            "SELECT {} FROM exchange_requests WHERE id = $1",
            EXCHANGE_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "exchange",
            id: id.to_string(),
        })?;

        let status = current
            .status
            .parse::<ExchangeStatus>()
            .unwrap_or(ExchangeStatus::Cancelled);

        match next {
            ExchangeStatus::Accepted | ExchangeStatus::Rejected => {
                if current.owner_id != actor {
                    return Err(DbError::Forbidden {
                        reason: "only the product owner can respond to this exchange",
                    });
                }
                if !status.is_pending() {
                    return Err(DbError::Conflict {
                        resource: "exchange",
                        detail: "is no longer pending",
                    });
                }
            }
            ExchangeStatus::Cancelled => {
                if current.requester_id != actor {
                    return Err(DbError::Forbidden {
                        reason: "only the requester can cancel this exchange",
                    });
                }
                if !status.is_pending() {
                    return Err(DbError::Conflict {
                        resource: "exchange",
                        detail: "is no longer pending",
                    });
                }
            }
            ExchangeStatus::Completed => {
                if current.owner_id != actor && current.requester_id != actor {
                    return Err(DbError::Forbidden {
                        reason: "not a participant in this exchange",
                    });
                }
                if !status.is_accepted() {
                    return Err(DbError::Conflict {
                        resource: "exchange",
                        detail: "must be accepted before completion",
                    });
                }
            }
            ExchangeStatus::Pending => {
                return Err(DbError::Invalid {
                    reason: "cannot return an exchange to pending",
                });
            }
        }

        let updated: ExchangeRequest = sqlx::query_as(&format!(
            r#"
            UPDATE exchange_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EXCHANGE_COLS
        ))
        .bind(id)
        .bind(next.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(updated)
    }

    async fn list_by(
        &self,
        column: &str,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<ExchangeWithProducts>, DbError> {
        let rows = sqlx::query(&format!(
            r#"{}, COUNT(*) OVER() AS total {}
            WHERE {} = $1
            ORDER BY e.created_at DESC
            LIMIT $2 OFFSET $3"#,
            EXCHANGE_SELECT, EXCHANGE_FROM, column
        ))
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
            .map(ExchangeWithProducts::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn product_brief(&self, id: Uuid) -> Result<ProductBrief, DbError> {
        let brief: Option<ProductBrief> =
            sqlx::query_as("SELECT seller_id, product_type FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        brief.ok_or_else(|| DbError::NotFound {
            resource: "product",
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil;

    async fn sale_only(pool: &PgPool, seller: Uuid) -> Uuid {
        let id = testutil::seed_product(pool, seller, "10.00", 1).await;
        sqlx::query("UPDATE products SET product_type = 'sale' WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_enforces_ownership_and_type() {
        let pool = testutil::pool().await;
        let repo = ExchangeRepo::new(&pool);
        let alice = testutil::seed_user(&pool).await;
        let bob = testutil::seed_user(&pool).await;
        let alices = testutil::seed_product(&pool, alice, "10.00", 1).await;
        let bobs = testutil::seed_product(&pool, bob, "12.00", 1).await;

        // Offering someone else's product
        let err = repo
            .create(alice, bobs, alices, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Forbidden { .. }));

        // Requesting your own product
        let another_of_alices = testutil::seed_product(&pool, alice, "5.00", 1).await;
        let err = repo
            .create(alice, alices, another_of_alices, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid { .. }));

        // Requesting a sale-only listing
        let bobs_sale_only = sale_only(&pool, bob).await;
        let err = repo
            .create(alice, alices, bobs_sale_only, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid { .. }));

        // Valid request derives the owner from the requested product
        let exchange = repo
            .create(alice, alices, bobs, Some("trade?".into()))
            .await
            .unwrap();
        assert_eq!(exchange.owner_id, bob);
        assert_eq!(exchange.status, "pending");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn lifecycle_accept_then_complete() {
        let pool = testutil::pool().await;
        let repo = ExchangeRepo::new(&pool);
        let alice = testutil::seed_user(&pool).await;
        let bob = testutil::seed_user(&pool).await;
        let alices = testutil::seed_product(&pool, alice, "10.00", 1).await;
        let bobs = testutil::seed_product(&pool, bob, "12.00", 1).await;

        let exchange = repo.create(alice, alices, bobs, None).await.unwrap();

        // Requester cannot accept
        let err = repo.accept(exchange.id, alice).await.unwrap_err();
        assert!(matches!(err, DbError::Forbidden { .. }));

        let accepted = repo.accept(exchange.id, bob).await.unwrap();
        assert_eq!(accepted.status, "accepted");

        // No longer pending: cancel and re-accept both conflict
        let err = repo.cancel(exchange.id, alice).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        let err = repo.accept(exchange.id, bob).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        // Either side can complete an accepted exchange
        let completed = repo.complete(exchange.id, alice).await.unwrap();
        assert_eq!(completed.status, "completed");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn requester_can_cancel_while_pending() {
        let pool = testutil::pool().await;
        let repo = ExchangeRepo::new(&pool);
        let alice = testutil::seed_user(&pool).await;
        let bob = testutil::seed_user(&pool).await;
        let alices = testutil::seed_product(&pool, alice, "10.00", 1).await;
        let bobs = testutil::seed_product(&pool, bob, "12.00", 1).await;

        let exchange = repo.create(alice, alices, bobs, None).await.unwrap();

        let err = repo.cancel(exchange.id, bob).await.unwrap_err();
        assert!(matches!(err, DbError::Forbidden { .. }));

        let cancelled = repo.cancel(exchange.id, alice).await.unwrap();
        assert_eq!(cancelled.status, "cancelled");

        let sent = repo.list_sent(alice, Pagination::default()).await.unwrap();
        assert!(sent
            .items
            .iter()
            .any(|e| e.id == exchange.id && e.status == "cancelled"));
    }
}
