//! Database migrations for the marketplace tables
//!
//! Idempotent CREATE TABLE IF NOT EXISTS statements, run at startup.
//! Derived columns (`products.favorites_count`, `carts.total`, the
//! reputation aggregates) default to zero and are only written by the
//! refresh functions in `db::counters`.

use sqlx::PgPool;

/// Run all migrations in order.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running marketplace migrations...");

    // Users and their 1:1 satellites
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            role TEXT NOT NULL DEFAULT 'buyer',
            is_verified BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            bio TEXT,
            avatar_path TEXT,
            address TEXT,
            city TEXT,
            state TEXT,
            country TEXT,
            postal_code TEXT,
            instagram TEXT,
            facebook TEXT,
            whatsapp TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reputations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            total_sales INTEGER NOT NULL DEFAULT 0,
            total_purchases INTEGER NOT NULL DEFAULT 0,
            positive_reviews INTEGER NOT NULL DEFAULT 0,
            negative_reviews INTEGER NOT NULL DEFAULT 0,
            average_rating NUMERIC(3,2) NOT NULL DEFAULT 0,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Catalog
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL UNIQUE,
            slug TEXT NOT NULL UNIQUE,
            description TEXT,
            icon TEXT,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            seller_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            category_id UUID NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            product_type TEXT NOT NULL DEFAULT 'sale',
            condition TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'available',
            price NUMERIC(10,2) NOT NULL CHECK (price >= 0),
            stock INTEGER NOT NULL DEFAULT 1 CHECK (stock >= 0),
            brand TEXT,
            color TEXT,
            size TEXT,
            city TEXT,
            state TEXT,
            views INTEGER NOT NULL DEFAULT 0,
            favorites_count INTEGER NOT NULL DEFAULT 0,
            expires_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_images (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            image_path TEXT NOT NULL,
            alt_text TEXT,
            is_primary BOOLEAN NOT NULL DEFAULT FALSE,
            position INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_view_events (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            viewer_id UUID REFERENCES users(id) ON DELETE SET NULL,
            ip TEXT,
            user_agent TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Carts
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS carts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            total NUMERIC(12,2) NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cart_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            cart_id UUID NOT NULL REFERENCES carts(id) ON DELETE CASCADE,
            product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            quantity INTEGER NOT NULL CHECK (quantity >= 1),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (cart_id, product_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Favorites
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorites (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, product_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Exchanges
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exchange_requests (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            offered_product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            requested_product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            requester_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Reviews
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            reviewer_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            reviewed_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            comment TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (reviewer_id, reviewed_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for the hot list paths
    for stmt in [
        "CREATE INDEX IF NOT EXISTS idx_products_status_created ON products (status, created_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_products_category_status ON products (category_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_products_seller_status ON products (seller_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_product_images_product ON product_images (product_id)",
        "CREATE INDEX IF NOT EXISTS idx_view_events_product ON product_view_events (product_id)",
        "CREATE INDEX IF NOT EXISTS idx_favorites_product ON favorites (product_id)",
        "CREATE INDEX IF NOT EXISTS idx_cart_items_cart ON cart_items (cart_id)",
        "CREATE INDEX IF NOT EXISTS idx_exchange_requester ON exchange_requests (requester_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_exchange_owner ON exchange_requests (owner_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_reviews_reviewed ON reviews (reviewed_id)",
    ] {
        sqlx::query(stmt).execute(pool).await?;
    }

    tracing::info!("Migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::create_pool;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");

        run(&pool).await.expect("first run failed");
        run(&pool).await.expect("second run failed");
    }
}
