//! Data models shared across services, handlers and pages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role. Staff record stock and manage the catalog; admins
/// additionally manage users, edit items and delete data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

/// Public projection of a user account. The credential hash never leaves
/// the auth service.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub reorder_level: i64,
    pub description: Option<String>,
    pub supplier_id: Option<i64>,
}

/// Item joined with its supplier for API listings. The supplier reference
/// is weak: after a supplier is deleted these fields come back empty.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemWithSupplier {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub reorder_level: i64,
    pub description: Option<String>,
    pub supplier_id: Option<i64>,
    pub supplier_name: Option<String>,
    pub supplier_contact: Option<String>,
}

/// One stock movement, recorded exactly as requested (signed delta),
/// append-only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movement {
    pub id: i64,
    pub item_id: i64,
    pub delta: i64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Movement joined with the current item name for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovementWithItem {
    pub id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub delta: i64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Direction of a stock transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TxKind {
    In,
    Out,
}

/// Unsigned counterpart of a movement: kind IN for non-negative deltas,
/// quantity is the delta's magnitude. Append-only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTransaction {
    pub id: i64,
    pub item_id: i64,
    pub kind: TxKind,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// One audit trail row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

/// Audit row joined with the acting username for the admin view
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityWithUser {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}
