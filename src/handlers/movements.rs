use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::MovementWithItem;
use crate::services::ledger::MovementFilter;
use crate::services::LedgerService;
use crate::web::empty_string_as_none;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub item_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub date_to: Option<NaiveDate>,
}

impl MovementQuery {
    pub fn into_filter(self) -> MovementFilter {
        MovementFilter {
            item_id: self.item_id,
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

pub async fn list_movements(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<Vec<MovementWithItem>>> {
    let service = LedgerService::new(state.db.clone());
    let movements = service.movements(&query.into_filter()).await?;
    Ok(Json(movements))
}
