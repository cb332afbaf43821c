mod common;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use stockroom::store;

async fn bare_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(false);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap()
}

#[tokio::test]
async fn init_is_idempotent() {
    let pool = common::memory_pool().await;
    common::seed_item(&pool, "Widget", 3, 5).await;

    store::init(&pool).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn init_adds_missing_columns_additively() {
    let pool = bare_pool().await;

    // Table shapes from before price, reorder_level, description,
    // supplier_id, role and created_at existed.
    sqlx::query(
        "CREATE TABLE items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            sku TEXT,
            quantity INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO items (name, quantity) VALUES ('Widget', 3)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO users (username, password_hash) VALUES ('old', 'x')")
        .execute(&pool)
        .await
        .unwrap();

    store::init(&pool).await.unwrap();

    let (price, reorder_level): (f64, i64) =
        sqlx::query_as("SELECT price, reorder_level FROM items WHERE name = 'Widget'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(price, 0.0);
    assert_eq!(reorder_level, 5);

    let quantity: i64 = sqlx::query_scalar("SELECT quantity FROM items WHERE name = 'Widget'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(quantity, 3, "existing data must survive the migration");

    let (role, created_at): (String, String) =
        sqlx::query_as("SELECT role, created_at FROM users WHERE username = 'old'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(role, "staff");
    assert!(!created_at.is_empty(), "created_at should be backfilled");
}

#[tokio::test]
async fn reset_clears_inventory_but_keeps_accounts() {
    let pool = common::memory_pool().await;
    let user_id = common::seed_user(&pool, "keeper", "pw", "admin").await;
    common::seed_item(&pool, "Widget", 3, 5).await;
    sqlx::query("INSERT INTO suppliers (name) VALUES ('Acme')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO activity_log (user_id, action, created_at) VALUES ($1, 'Logged in', $2)")
        .bind(user_id)
        .bind(chrono::Utc::now())
        .execute(&pool)
        .await
        .unwrap();

    store::reset_data(&pool).await.unwrap();

    for table in ["items", "suppliers", "movements", "stock_transactions"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "{} should be empty after reset", table);
    }

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
    let log_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_log")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(log_entries, 1);

    // Id sequences start over for the cleared tables.
    let new_id = common::seed_item(&pool, "Fresh", 1, 5).await;
    assert_eq!(new_id, 1);
}
