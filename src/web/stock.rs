//! Stock movement recording page

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::PageUser;
use crate::services::ledger::RECENT_MOVEMENT_CAP;
use crate::services::session::SessionUser;
use crate::services::{ItemService, LedgerService};
use crate::web::{error_banner, escape, layout, notice};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StockPageQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovementForm {
    pub item_id: i64,
    pub delta: i64,
    pub note: Option<String>,
}

async fn render_stock_page(
    state: &AppState,
    user: &SessionUser,
    banner: &str,
) -> AppResult<Html<String>> {
    let options = ItemService::new(state.db.clone()).options().await?;
    let movements = LedgerService::new(state.db.clone())
        .recent_movements(RECENT_MOVEMENT_CAP)
        .await?;

    let item_options: String = options
        .iter()
        .map(|(id, name)| format!(r#"<option value="{}">{}</option>"#, id, escape(name)))
        .collect();

    let form = format!(
        concat!(
            r#"<fieldset><legend>Record movement</legend>"#,
            r#"<form method="post" action="/stock">"#,
            r#"<label for="item_id">Item</label>"#,
            r#"<select id="item_id" name="item_id" required>{options}</select>"#,
            r#"<label for="delta">Delta (positive receives, negative issues)</label>"#,
            r#"<input id="delta" name="delta" type="number" required>"#,
            r#"<label for="note">Note</label><input id="note" name="note">"#,
            r#"<p><button type="submit">Record</button></p>"#,
            "</form></fieldset>"
        ),
        options = item_options,
    );

    let table = if movements.is_empty() {
        "<p>No movements recorded yet.</p>".to_string()
    } else {
        let rows: String = movements
            .iter()
            .map(|m| {
                format!(
                    "<tr><td>{when}</td><td>{item}</td><td>{delta:+}</td><td>{note}</td></tr>",
                    when = m.created_at.format("%Y-%m-%d %H:%M"),
                    item = escape(&m.item_name),
                    delta = m.delta,
                    note = escape(&m.note),
                )
            })
            .collect();
        format!(
            concat!(
                "<table><thead><tr><th>When</th><th>Item</th>",
                "<th>Delta</th><th>Note</th></tr></thead>",
                "<tbody>{rows}</tbody></table>"
            ),
            rows = rows,
        )
    };

    let body = format!(
        "<h1>Stock</h1>{banner}{form}<h2>Recent movements</h2>{table}",
        banner = banner,
        form = form,
        table = table,
    );

    Ok(Html(layout("Stock", Some(user), &body)))
}

pub async fn stock_page(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Query(query): Query<StockPageQuery>,
) -> AppResult<Html<String>> {
    let banner = match query.status.as_deref() {
        Some("recorded") => notice("Movement recorded."),
        _ => String::new(),
    };
    render_stock_page(&state, &user, &banner).await
}

pub async fn record_movement(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Form(form): Form<MovementForm>,
) -> AppResult<Response> {
    let ledger = LedgerService::new(state.db.clone());
    let note = form.note.as_deref().unwrap_or("");

    match ledger.apply_delta(form.item_id, form.delta, note).await {
        Ok(_) => Ok(Redirect::to("/stock?status=recorded").into_response()),
        Err(AppError::Validation { message, .. }) => Ok(render_stock_page(
            &state,
            &user,
            &error_banner(&message),
        )
        .await?
        .into_response()),
        Err(AppError::NotFound(_)) => Ok(render_stock_page(
            &state,
            &user,
            &error_banner("Item not found"),
        )
        .await?
        .into_response()),
        Err(e) => Err(e),
    }
}
