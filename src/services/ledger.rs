//! Stock ledger: the single write path for item quantities.
//!
//! Every accepted delta appends one Movement (the delta exactly as
//! requested) and one StockTransaction (its magnitude, typed IN or OUT),
//! and clamps the item quantity at zero. The three writes always share a
//! transaction.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::models::{Movement, MovementWithItem, StockTransaction, TxKind};

/// Movement listings never return more rows than this
pub const RECENT_MOVEMENT_CAP: i64 = 50;

/// Outcome of one applied delta
#[derive(Debug, Clone, Serialize)]
pub struct DeltaReceipt {
    pub movement: Movement,
    pub transaction: StockTransaction,
    pub new_quantity: i64,
}

/// Filters for the movement history. Absent fields are unconstrained;
/// present ones combine conjunctively. `date_to` covers its whole day.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub item_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct LedgerService {
    db: SqlitePool,
}

impl LedgerService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Apply a signed stock delta to an item.
    ///
    /// The quantity clamps at zero on underflow while the journal keeps
    /// the requested figures. Zero deltas are rejected, unknown items are
    /// an explicit error.
    pub async fn apply_delta(&self, item_id: i64, delta: i64, note: &str) -> AppResult<DeltaReceipt> {
        if delta == 0 {
            return Err(AppError::Validation {
                field: "delta".to_string(),
                message: "Delta must be a non-zero integer".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let receipt = record_delta_on(&mut *tx, item_id, delta, note).await?;
        tx.commit().await?;

        Ok(receipt)
    }

    /// The most recent movements joined with their item names, newest
    /// first. The cap holds regardless of the requested limit.
    pub async fn recent_movements(&self, limit: i64) -> AppResult<Vec<MovementWithItem>> {
        let limit = limit.clamp(1, RECENT_MOVEMENT_CAP);
        let rows = sqlx::query_as(
            "SELECT m.id, m.item_id, i.name AS item_name, m.delta, m.note, m.created_at \
             FROM movements m JOIN items i ON i.id = m.item_id \
             ORDER BY m.id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Movement history matching the filter, newest first
    pub async fn movements(&self, filter: &MovementFilter) -> AppResult<Vec<MovementWithItem>> {
        let mut sql = String::from(
            "SELECT m.id, m.item_id, i.name AS item_name, m.delta, m.note, m.created_at \
             FROM movements m JOIN items i ON i.id = m.item_id WHERE 1=1",
        );
        if filter.item_id.is_some() {
            sql.push_str(" AND m.item_id = ?");
        }
        if filter.date_from.is_some() {
            sql.push_str(" AND m.created_at >= ?");
        }
        if filter.date_to.is_some() {
            sql.push_str(" AND m.created_at < ?");
        }
        sql.push_str(" ORDER BY m.created_at DESC, m.id DESC");

        let mut query = sqlx::query_as::<_, MovementWithItem>(&sql);
        if let Some(item_id) = filter.item_id {
            query = query.bind(item_id);
        }
        if let Some(from) = filter.date_from {
            query = query.bind(day_start(from));
        }
        if let Some(to) = filter.date_to {
            // inclusive of the whole end day
            query = query.bind(day_start(to) + Duration::days(1));
        }

        Ok(query.fetch_all(&self.db).await?)
    }
}

/// Perform the ledger writes on an open transaction. Callers batching
/// other writes with the delta (the admin item edit) share theirs here.
pub(crate) async fn record_delta_on(
    conn: &mut SqliteConnection,
    item_id: i64,
    delta: i64,
    note: &str,
) -> AppResult<DeltaReceipt> {
    // The clamped update runs first so the write lock is taken before the
    // appends, serializing concurrent deltas on the same item.
    let new_quantity: i64 = sqlx::query_scalar(
        "UPDATE items SET quantity = MAX(0, quantity + $1) WHERE id = $2 RETURNING quantity",
    )
    .bind(delta)
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

    let now = Utc::now();

    let movement: Movement = sqlx::query_as(
        "INSERT INTO movements (item_id, delta, note, created_at) VALUES ($1, $2, $3, $4) \
         RETURNING id, item_id, delta, note, created_at",
    )
    .bind(item_id)
    .bind(delta)
    .bind(note)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    let kind = if delta >= 0 { TxKind::In } else { TxKind::Out };
    let transaction: StockTransaction = sqlx::query_as(
        "INSERT INTO stock_transactions (item_id, kind, quantity, created_at) \
         VALUES ($1, $2, $3, $4) RETURNING id, item_id, kind, quantity, created_at",
    )
    .bind(item_id)
    .bind(kind)
    .bind(delta.abs())
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(DeltaReceipt {
        movement,
        transaction,
        new_quantity,
    })
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
