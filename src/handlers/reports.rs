use axum::{
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Item;
use crate::services::ReportsService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportReceipt {
    pub status: String,
    pub path: String,
}

pub async fn low_stock(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<Item>>> {
    let service = ReportsService::new(state.db.clone());
    let items = service.low_stock().await?;
    Ok(Json(items))
}

pub async fn movement_summary(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportsService::new(state.db.clone());
    let summary = service.movement_summary().await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportsService::export_to_csv(&summary)?;
        return Ok((
            [
                (CONTENT_TYPE, "text/csv"),
                (
                    CONTENT_DISPOSITION,
                    "attachment; filename=\"movement_summary.csv\"",
                ),
            ],
            csv,
        )
            .into_response());
    }

    Ok(Json(summary).into_response())
}

pub async fn export_pdf(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<ExportReceipt>> {
    let service = ReportsService::new(state.db.clone());
    let summary = service.movement_summary().await?;
    let path = ReportsService::render_pdf(&summary, &state.config.reports.output_dir)?;

    Ok(Json(ExportReceipt {
        status: "ok".to_string(),
        path,
    }))
}
