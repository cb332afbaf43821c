use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::{CurrentAdmin, CurrentUser};
use crate::models::{Item, ItemWithSupplier};
use crate::services::items::NewItem;
use crate::services::{ActivityService, ItemService};
use crate::AppState;

pub async fn list_items(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<ItemWithSupplier>>> {
    let service = ItemService::new(state.db.clone());
    let items = service.list_with_suppliers().await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(input): Json<NewItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let service = ItemService::new(state.db.clone());
    let item = service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(item_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let service = ItemService::new(state.db.clone());
    service.delete(item_id).await?;

    ActivityService::new(state.db.clone())
        .record(admin.user_id, &format!("Deleted item {}", item_id))
        .await?;

    Ok(Json(json!({ "status": "deleted" })))
}
