//! Review repository
//!
//! One review per (reviewer, reviewed) pair, enforced by the unique
//! index. Creating a review updates the reviewed user's reputation in
//! the same transaction: either both land or neither does.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use lacquer_core::models::{Paginated, Pagination, Rating};

use super::{is_foreign_key_violation, is_unique_violation, DbError};
use crate::db::counters;

/// Review record from database
#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Review with both usernames for list views
#[derive(Debug, Clone, FromRow)]
pub struct ReviewWithParties {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewer_username: String,
    pub reviewed_id: Uuid,
    pub reviewed_username: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

const REVIEW_COLS: &str = "id, reviewer_id, reviewed_id, rating, comment, created_at";

const REVIEW_JOINED: &str = r#"
    SELECT rv.id, rv.reviewer_id, reviewer.username AS reviewer_username,
           rv.reviewed_id, reviewed.username AS reviewed_username,
           rv.rating, rv.comment, rv.created_at"#;

const REVIEW_FROM: &str = r#"
    FROM reviews rv
    JOIN users reviewer ON reviewer.id = rv.reviewer_id
    JOIN users reviewed ON reviewed.id = rv.reviewed_id"#;

/// Review repository
pub struct ReviewRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Leave a review and fold it into the target's reputation.
    pub async fn create(
        &self,
        reviewer_id: Uuid,
        reviewed_id: Uuid,
        rating: Rating,
        comment: Option<String>,
    ) -> Result<Review, DbError> {
        if reviewer_id == reviewed_id {
            return Err(DbError::Invalid {
                reason: "cannot review yourself",
            });
        }

        let mut tx = self.pool.begin().await?;

        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(reviewed_id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(DbError::NotFound {
                resource: "user",
                id: reviewed_id.to_string(),
            });
        }

        let review: Review = sqlx::query_as(&format!(
            r#"
            INSERT INTO reviews (reviewer_id, reviewed_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            REVIEW_COLS
        ))
        .bind(reviewer_id)
        .bind(reviewed_id)
        .bind(rating.value())
        .bind(comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::Conflict {
                    resource: "review",
                    detail: "already reviewed this user",
                }
            } else if is_foreign_key_violation(&e) {
                DbError::NotFound {
                    resource: "user",
                    id: reviewer_id.to_string(),
                }
            } else {
                DbError::Sqlx(e)
            }
        })?;

        counters::apply_review_to_reputation(&mut tx, reviewed_id, &rating).await?;
        tx.commit().await?;

        Ok(review)
    }

    /// Reviews written about a user, newest first.
    pub async fn list_received(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<ReviewWithParties>, DbError> {
        self.list_by("rv.reviewed_id", user_id, page).await
    }

    /// Reviews a user has written, newest first.
    pub async fn list_given(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<ReviewWithParties>, DbError> {
        self.list_by("rv.reviewer_id", user_id, page).await
    }

    async fn list_by(
        &self,
        column: &str,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<ReviewWithParties>, DbError> {
        let rows = sqlx::query(&format!(
            r#"{}, COUNT(*) OVER() AS total {}
            WHERE {} = $1
            ORDER BY rv.created_at DESC
            LIMIT $2 OFFSET $3"#,
            REVIEW_JOINED, REVIEW_FROM, column
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
            .map(ReviewWithParties::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated::new(items, total, page))
    }
}
