//! User repository
//!
//! Registration creates the user row plus its profile and reputation
//! satellites in one transaction; a user never exists without them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use lacquer_core::models::{Email, Role, Username};

use super::{is_unique_violation, DbError};

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile record (1:1 with users)
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub whatsapp: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reputation record (1:1 with users, all fields derived)
#[derive(Debug, Clone, FromRow)]
pub struct Reputation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_sales: i32,
    pub total_purchases: i32,
    pub positive_reviews: i32,
    pub negative_reviews: i32,
    pub average_rating: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// User with profile and reputation for detail views
#[derive(Debug, Clone)]
pub struct UserDetail {
    pub user: User,
    pub profile: Profile,
    pub reputation: Reputation,
}

/// Validated registration input
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub phone: Option<String>,
    pub role: Role,
}

/// Partial profile update; None leaves the stored value untouched
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub whatsapp: Option<String>,
}

const PROFILE_COLS: &str =
    "id, user_id, bio, avatar_path, address, city, state, country, postal_code, \
     instagram, facebook, whatsapp, created_at, updated_at";

const REPUTATION_COLS: &str = "id, user_id, total_sales, total_purchases, positive_reviews, \
     negative_reviews, average_rating, updated_at";

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a user: user + profile + reputation in one transaction.
    ///
    /// The profile and reputation rows start empty/zeroed and exist from
    /// the first moment, so later counter updates never have to create them.
    pub async fn register(&self, new: NewUser) -> Result<UserDetail, DbError> {
        let mut tx = self.pool.begin().await?;

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, phone, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, phone, role, is_verified, created_at, updated_at
            "#,
        )
        .bind(new.username.as_str())
        .bind(new.email.as_str())
        .bind(new.phone.as_deref())
        .bind(new.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::Conflict {
                    resource: "user",
                    detail: "username or email already taken",
                }
            } else {
                DbError::Sqlx(e)
            }
        })?;

        let profile: Profile = sqlx::query_as(&format!(
            "INSERT INTO profiles (user_id) VALUES ($1) RETURNING {}",
            PROFILE_COLS
        ))
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        let reputation: Reputation = sqlx::query_as(&format!(
            "INSERT INTO reputations (user_id) VALUES ($1) RETURNING {}",
            REPUTATION_COLS
        ))
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(UserDetail {
            user,
            profile,
            reputation,
        })
    }

    /// Get a single user by ID.
    pub async fn get(&self, id: Uuid) -> Result<User, DbError> {
        let user: User = sqlx::query_as(
            r#"
            SELECT id, username, email, phone, role, is_verified, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "user",
            id: id.to_string(),
        })?;

        Ok(user)
    }

    /// Get a user with profile and reputation.
    pub async fn get_detail(&self, id: Uuid) -> Result<UserDetail, DbError> {
        let user = self.get(id).await?;

        let profile: Profile = sqlx::query_as(&format!(
            "SELECT {} FROM profiles WHERE user_id = $1",
            PROFILE_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "profile",
            id: id.to_string(),
        })?;

        let reputation: Reputation = sqlx::query_as(&format!(
            "SELECT {} FROM reputations WHERE user_id = $1",
            REPUTATION_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "reputation",
            id: id.to_string(),
        })?;

        Ok(UserDetail {
            user,
            profile,
            reputation,
        })
    }

    /// Partial profile update; absent fields keep their stored value.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Profile, DbError> {
        let profile: Profile = sqlx::query_as(&format!(
            r#"
            UPDATE profiles
            SET bio = COALESCE($2, bio),
                avatar_path = COALESCE($3, avatar_path),
                address = COALESCE($4, address),
                city = COALESCE($5, city),
                state = COALESCE($6, state),
                country = COALESCE($7, country),
                postal_code = COALESCE($8, postal_code),
                instagram = COALESCE($9, instagram),
                facebook = COALESCE($10, facebook),
                whatsapp = COALESCE($11, whatsapp),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            PROFILE_COLS
        ))
        .bind(user_id)
        .bind(changes.bio)
        .bind(changes.avatar_path)
        .bind(changes.address)
        .bind(changes.city)
        .bind(changes.state)
        .bind(changes.country)
        .bind(changes.postal_code)
        .bind(changes.instagram)
        .bind(changes.facebook)
        .bind(changes.whatsapp)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "profile",
            id: user_id.to_string(),
        })?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil;
    use uuid::Uuid;

    // Integration tests - run with DATABASE_URL set
    // cargo test -p lacquer-server -- --ignored

    fn unique_new_user() -> NewUser {
        let tag = Uuid::new_v4().simple().to_string();
        NewUser {
            username: Username::new(&format!("reg-{}", tag)).unwrap(),
            email: Email::new(&format!("reg-{}@example.com", tag)).unwrap(),
            phone: None,
            role: Role::Seller,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn register_creates_profile_and_reputation() {
        let pool = testutil::pool().await;
        let repo = UserRepo::new(&pool);

        let detail = repo.register(unique_new_user()).await.unwrap();
        assert_eq!(detail.user.role, "seller");
        assert_eq!(detail.profile.user_id, detail.user.id);
        assert_eq!(detail.reputation.positive_reviews, 0);
        assert_eq!(detail.reputation.negative_reviews, 0);
        assert_eq!(detail.reputation.average_rating, Decimal::ZERO);

        let fetched = repo.get_detail(detail.user.id).await.unwrap();
        assert_eq!(fetched.user.username, detail.user.username);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_username_conflicts() {
        let pool = testutil::pool().await;
        let repo = UserRepo::new(&pool);

        let first = unique_new_user();
        let username = first.username.clone();
        repo.register(first).await.unwrap();

        let tag = Uuid::new_v4().simple().to_string();
        let dup = NewUser {
            username,
            email: Email::new(&format!("other-{}@example.com", tag)).unwrap(),
            phone: None,
            role: Role::Buyer,
        };
        let err = repo.register(dup).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { resource: "user", .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn profile_update_is_partial() {
        let pool = testutil::pool().await;
        let repo = UserRepo::new(&pool);
        let detail = repo.register(unique_new_user()).await.unwrap();

        let changes = ProfileChanges {
            bio: Some("Nail tech since 2019".into()),
            city: Some("Rosario".into()),
            ..Default::default()
        };
        let profile = repo.update_profile(detail.user.id, changes).await.unwrap();
        assert_eq!(profile.bio.as_deref(), Some("Nail tech since 2019"));

        // Second update leaves earlier fields alone
        let changes = ProfileChanges {
            instagram: Some("@nails".into()),
            ..Default::default()
        };
        let profile = repo.update_profile(detail.user.id, changes).await.unwrap();
        assert_eq!(profile.bio.as_deref(), Some("Nail tech since 2019"));
        assert_eq!(profile.city.as_deref(), Some("Rosario"));
        assert_eq!(profile.instagram.as_deref(), Some("@nails"));
    }
}
