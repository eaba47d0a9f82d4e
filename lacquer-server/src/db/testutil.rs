//! Shared setup for database-backed tests
//!
//! All rows get unique usernames/slugs so ignored tests can run
//! repeatedly against the same database.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = super::pool::create_pool(&url)
        .await
        .expect("pool creation failed");
    super::migrations::run(&pool).await.expect("migrations failed");
    pool
}

/// Insert a user with profile and reputation, like registration does.
pub(crate) async fn seed_user(pool: &PgPool) -> Uuid {
    let tag = Uuid::new_v4().simple().to_string();
    let (id,): (Uuid,) =
        sqlx::query_as("INSERT INTO users (username, email) VALUES ($1, $2) RETURNING id")
            .bind(format!("user-{}", tag))
            .bind(format!("user-{}@example.com", tag))
            .fetch_one(pool)
            .await
            .expect("seed user failed");

    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await
        .expect("seed profile failed");
    sqlx::query("INSERT INTO reputations (user_id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await
        .expect("seed reputation failed");

    id
}

pub(crate) async fn seed_category(pool: &PgPool) -> Uuid {
    let tag = Uuid::new_v4().simple().to_string();
    let (id,): (Uuid,) =
        sqlx::query_as("INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id")
            .bind(format!("Category {}", tag))
            .bind(format!("category-{}", tag))
            .fetch_one(pool)
            .await
            .expect("seed category failed");
    id
}

pub(crate) async fn seed_product(pool: &PgPool, seller_id: Uuid, price: &str, stock: i32) -> Uuid {
    let category_id = seed_category(pool).await;
    let price: Decimal = price.parse().expect("bad test price");

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO products (seller_id, category_id, title, condition, product_type, price, stock)
        VALUES ($1, $2, 'Test polish', 'new', 'both', $3, $4)
        RETURNING id
        "#,
    )
    .bind(seller_id)
    .bind(category_id)
    .bind(price)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("seed product failed");

    id
}
