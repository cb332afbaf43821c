//! SQLite store: connection options, schema and additive migrations

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;
use crate::error::AppResult;

/// Table creation statements. References between tables are declared for
/// documentation but not enforced: supplier deletion leaves items pointing
/// at a gone row, and ledger/audit rows outlive their referents.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'staff',
        created_at TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS suppliers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        contact TEXT
    )",
    "CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        sku TEXT,
        price REAL NOT NULL DEFAULT 0,
        quantity INTEGER NOT NULL DEFAULT 0,
        reorder_level INTEGER NOT NULL DEFAULT 5,
        description TEXT,
        supplier_id INTEGER REFERENCES suppliers(id)
    )",
    "CREATE TABLE IF NOT EXISTS movements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id INTEGER NOT NULL REFERENCES items(id),
        delta INTEGER NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS stock_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id INTEGER NOT NULL REFERENCES items(id),
        kind TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS activity_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        action TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_movements_item ON movements(item_id)",
    "CREATE INDEX IF NOT EXISTS idx_movements_created ON movements(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_stock_transactions_item ON stock_transactions(item_id)",
];

/// Open the SQLite pool described by the configuration
pub async fn connect(config: &DatabaseConfig) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create missing tables and indexes, then apply additive column
/// migrations. Existing data is never dropped or rewritten.
pub async fn init(pool: &SqlitePool) -> AppResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    // Columns added after the first release. Databases created by older
    // binaries pick them up here.
    ensure_column(pool, "users", "role", "TEXT NOT NULL DEFAULT 'staff'").await?;
    ensure_column(pool, "users", "created_at", "TEXT NOT NULL DEFAULT ''").await?;
    ensure_column(pool, "items", "price", "REAL NOT NULL DEFAULT 0").await?;
    ensure_column(pool, "items", "reorder_level", "INTEGER NOT NULL DEFAULT 5").await?;
    ensure_column(pool, "items", "description", "TEXT").await?;
    ensure_column(pool, "items", "supplier_id", "INTEGER").await?;

    // Accounts that predate the created_at column carry the empty marker;
    // stamp them with the migration time.
    sqlx::query("UPDATE users SET created_at = $1 WHERE created_at = ''")
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

    Ok(())
}

async fn ensure_column(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    definition: &str,
) -> AppResult<()> {
    let columns: Vec<String> =
        sqlx::query_scalar(&format!("SELECT name FROM pragma_table_info('{}')", table))
            .fetch_all(pool)
            .await?;

    if !columns.iter().any(|c| c == column) {
        sqlx::query(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, column, definition
        ))
        .execute(pool)
        .await?;
        tracing::info!("Migration: added column {}.{}", table, column);
    }

    Ok(())
}

/// Full data reset: clears the operational tables and their id sequences
/// in one transaction. User accounts and the activity log survive.
pub async fn reset_data(pool: &SqlitePool) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    for table in ["movements", "stock_transactions", "items", "suppliers"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query(
        "DELETE FROM sqlite_sequence \
         WHERE name IN ('movements', 'stock_transactions', 'items', 'suppliers')",
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
