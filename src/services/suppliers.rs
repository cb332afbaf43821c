//! Suppliers: weakly referenced by catalog items

use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::Supplier;

#[derive(Debug, Deserialize, Validate)]
pub struct NewSupplier {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Clone)]
pub struct SupplierService {
    db: SqlitePool,
}

impl SupplierService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as("SELECT id, name, contact FROM suppliers ORDER BY id")
            .fetch_all(&self.db)
            .await?;
        Ok(suppliers)
    }

    pub async fn create(&self, input: &NewSupplier) -> AppResult<Supplier> {
        input.validate()?;

        let supplier = sqlx::query_as(
            "INSERT INTO suppliers (name, contact) VALUES ($1, $2) RETURNING id, name, contact",
        )
        .bind(input.name.trim())
        .bind(&input.contact)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    /// Delete a supplier. Items referencing it keep their dangling
    /// supplier_id; joined listings then show no supplier.
    pub async fn delete(&self, supplier_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }
}
