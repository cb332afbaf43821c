use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Supplier;
use crate::services::suppliers::NewSupplier;
use crate::services::SupplierService;
use crate::AppState;

pub async fn list_suppliers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<Supplier>>> {
    let service = SupplierService::new(state.db.clone());
    let suppliers = service.list().await?;
    Ok(Json(suppliers))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(input): Json<NewSupplier>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    let service = SupplierService::new(state.db.clone());
    let supplier = service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(supplier_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let service = SupplierService::new(state.db.clone());
    service.delete(supplier_id).await?;
    Ok(Json(json!({ "status": "deleted" })))
}
