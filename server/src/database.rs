// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::info;

/// Categories shipped with a fresh database.
const DEFAULT_CATEGORIES: &[(&str, &str, i64)] = &[
    ("Personal", "#6b46c1", 1),
    ("Grocery List", "#059669", 2),
    ("Restaurants", "#dc2626", 3),
    ("Books to Read", "#7c2d12", 4),
    ("Things to Buy", "#1d4ed8", 5),
];

/// Establishes the database connection pool.
/// If the database does not exist, it creates it, then applies the schema
/// and seeds the starter categories.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    init_schema(&pool)
        .await
        .context("Failed to initialize schema")?;
    seed_default_categories(&pool)
        .await
        .context("Failed to seed default categories")?;

    info!("Database schema is ready.");

    Ok(pool)
}

/// Creates the tables and indexes. Idempotent; tests use it to set up
/// in-memory databases with the exact production schema.
///
/// The two reference kinds are modeled in the schema itself: the weak
/// category/parent links clear on deletion (`ON DELETE SET NULL`), the
/// todo -> migration-log link is strong (`ON DELETE CASCADE`).
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT FALSE,
            category_id INTEGER NULL,
            scheduled_date DATE NULL, -- NULL for someday todos
            sort_order INTEGER NOT NULL DEFAULT 0,
            color TEXT NULL,
            recurring_pattern TEXT NULL,
            parent_id INTEGER NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL,
            FOREIGN KEY (parent_id) REFERENCES todos(id) ON DELETE SET NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS todo_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            todo_id INTEGER NOT NULL,
            from_date DATE NOT NULL,
            to_date DATE NOT NULL,
            migrated_at TIMESTAMP NOT NULL,
            FOREIGN KEY (todo_id) REFERENCES todos(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_todos_scheduled_date ON todos(scheduled_date);",
        "CREATE INDEX IF NOT EXISTS idx_todos_category_id ON todos(category_id);",
        "CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed);",
        "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at);",
        "CREATE INDEX IF NOT EXISTS idx_categories_sort_order ON categories(sort_order);",
    ] {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

/// Seeds the starter categories. `INSERT OR IGNORE` keeps existing rows,
/// including ones the user renamed or recolored, untouched.
pub async fn seed_default_categories(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    for &(name, color, sort_order) in DEFAULT_CATEGORIES {
        sqlx::query(
            "INSERT OR IGNORE INTO categories (name, color, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(color)
        .bind(sort_order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Checks that the store answers a trivial query.
pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory SQLite");
        init_schema(&pool).await.expect("Failed to create schema");
        pool
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = setup_test_db().await;

        // Running the schema a second time must not fail or wipe data.
        sqlx::query("INSERT INTO categories (name, color, sort_order, created_at, updated_at) VALUES ('Keep', '#fff', 0, ?, ?)")
            .bind(Utc::now())
            .bind(Utc::now())
            .execute(&pool)
            .await
            .unwrap();

        init_schema(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_seed_preserves_user_edits() {
        let pool = setup_test_db().await;

        seed_default_categories(&pool).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, DEFAULT_CATEGORIES.len() as i64);

        // Recolor one seeded row, reseed, and assert the edit survives.
        sqlx::query("UPDATE categories SET color = '#123456' WHERE name = 'Personal'")
            .execute(&pool)
            .await
            .unwrap();
        seed_default_categories(&pool).await.unwrap();

        let color: String =
            sqlx::query_scalar("SELECT color FROM categories WHERE name = 'Personal'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(color, "#123456");
    }

    #[tokio::test]
    async fn test_health_check() {
        let pool = setup_test_db().await;
        assert!(health_check(&pool).await.is_ok());
    }
}
