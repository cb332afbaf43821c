//! Catalog items and the admin edit path

use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Item, ItemWithSupplier};
use crate::services::ledger::{record_delta_on, DeltaReceipt};

/// Reorder level assigned when a new item does not specify one
pub const DEFAULT_REORDER_LEVEL: i64 = 5;

#[derive(Debug, Deserialize, Validate)]
pub struct NewItem {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub sku: Option<String>,
    #[validate(range(min = 0.0, max = 1_000_000_000.0, message = "Price must be a non-negative number"))]
    #[serde(default)]
    pub price: f64,
    #[validate(range(min = 0, message = "Quantity must be non-negative"))]
    #[serde(default)]
    pub quantity: i64,
    #[validate(range(min = 0, message = "Reorder level must be non-negative"))]
    #[serde(default = "default_reorder_level")]
    pub reorder_level: i64,
    pub description: Option<String>,
    pub supplier_id: Option<i64>,
}

fn default_reorder_level() -> i64 {
    DEFAULT_REORDER_LEVEL
}

/// Fields the admin edit form carries
#[derive(Debug, Deserialize, Validate)]
pub struct ItemUpdate {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub sku: Option<String>,
    #[validate(range(min = 0.0, max = 1_000_000_000.0, message = "Price must be a non-negative number"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Quantity must be non-negative"))]
    pub quantity: i64,
    #[validate(range(min = 0, message = "Reorder level must be non-negative"))]
    pub reorder_level: i64,
}

#[derive(Clone)]
pub struct ItemService {
    db: SqlitePool,
}

impl ItemService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<Item>> {
        let items = sqlx::query_as(
            "SELECT id, name, sku, price, quantity, reorder_level, description, supplier_id \
             FROM items ORDER BY id DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    /// Items joined with supplier details for the API listing
    pub async fn list_with_suppliers(&self) -> AppResult<Vec<ItemWithSupplier>> {
        let items = sqlx::query_as(
            "SELECT i.id, i.name, i.sku, i.price, i.quantity, i.reorder_level, i.description, \
                    i.supplier_id, s.name AS supplier_name, s.contact AS supplier_contact \
             FROM items i LEFT JOIN suppliers s ON s.id = i.supplier_id \
             ORDER BY i.id DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    pub async fn get(&self, item_id: i64) -> AppResult<Item> {
        sqlx::query_as(
            "SELECT id, name, sku, price, quantity, reorder_level, description, supplier_id \
             FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    pub async fn create(&self, input: &NewItem) -> AppResult<Item> {
        input.validate()?;

        let item = sqlx::query_as(
            "INSERT INTO items (name, sku, price, quantity, reorder_level, description, supplier_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, name, sku, price, quantity, reorder_level, description, supplier_id",
        )
        .bind(input.name.trim())
        .bind(&input.sku)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.reorder_level)
        .bind(&input.description)
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await?;

        Ok(item)
    }

    /// Admin edit. Catalog fields are overwritten, but a quantity change
    /// goes through the ledger as an implied delta in the same
    /// transaction, keeping the movement trail complete. An unchanged
    /// quantity writes no ledger rows.
    pub async fn update(
        &self,
        item_id: i64,
        input: &ItemUpdate,
    ) -> AppResult<(Item, Option<DeltaReceipt>)> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let current_quantity: i64 = sqlx::query_scalar(
            "UPDATE items SET name = $1, sku = $2, price = $3, reorder_level = $4 \
             WHERE id = $5 RETURNING quantity",
        )
        .bind(input.name.trim())
        .bind(&input.sku)
        .bind(input.price)
        .bind(input.reorder_level)
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let implied_delta = input.quantity - current_quantity;
        let receipt = if implied_delta != 0 {
            Some(record_delta_on(&mut *tx, item_id, implied_delta, "Adjusted via item edit").await?)
        } else {
            None
        };

        let item: Item = sqlx::query_as(
            "SELECT id, name, sku, price, quantity, reorder_level, description, supplier_id \
             FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((item, receipt))
    }

    pub async fn delete(&self, item_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }
        Ok(())
    }

    /// Item id/name pairs for form dropdowns, name order
    pub async fn options(&self) -> AppResult<Vec<(i64, String)>> {
        let options = sqlx::query_as("SELECT id, name FROM items ORDER BY name ASC")
            .fetch_all(&self.db)
            .await?;
        Ok(options)
    }
}
