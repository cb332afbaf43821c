//! Reports page: filterable movement history, summary and exports

use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::PageUser;
use crate::services::ledger::MovementFilter;
use crate::services::{ItemService, LedgerService, ReportsService};
use crate::web::{empty_string_as_none, escape, layout};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub item_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub date_to: Option<NaiveDate>,
}

const SCRIPT: &str = r#"<script>
async function exportPdf() {
    const status = document.getElementById('export-status');
    try {
        const res = await fetch('/api/reports/export', {method: 'POST'});
        const data = await res.json();
        if (res.ok && data.status === 'ok') {
            status.className = 'notice';
            status.textContent = 'Report written to ' + data.path;
            return;
        }
    } catch (e) {}
    status.className = 'error';
    status.textContent = 'Export failed';
}
</script>"#;

pub async fn reports_page(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Html<String>> {
    let filter = MovementFilter {
        item_id: query.item_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };

    let movements = LedgerService::new(state.db.clone()).movements(&filter).await?;
    let summary = ReportsService::new(state.db.clone()).movement_summary().await?;
    let options = ItemService::new(state.db.clone()).options().await?;

    let item_options: String = options
        .iter()
        .map(|(id, name)| {
            let selected = if query.item_id == Some(*id) { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                id,
                selected,
                escape(name)
            )
        })
        .collect();

    let filter_form = format!(
        concat!(
            r#"<fieldset><legend>Filter movements</legend>"#,
            r#"<form method="get" action="/reports">"#,
            r#"<label for="item_id">Item</label>"#,
            r#"<select id="item_id" name="item_id"><option value="">All items</option>{options}</select>"#,
            r#"<label for="date_from">From</label>"#,
            r#"<input id="date_from" name="date_from" type="date" value="{date_from}">"#,
            r#"<label for="date_to">To (inclusive)</label>"#,
            r#"<input id="date_to" name="date_to" type="date" value="{date_to}">"#,
            r#"<p><button type="submit">Apply</button> <a href="/reports">Clear</a></p>"#,
            "</form></fieldset>"
        ),
        options = item_options,
        date_from = query.date_from.map(|d| d.to_string()).unwrap_or_default(),
        date_to = query.date_to.map(|d| d.to_string()).unwrap_or_default(),
    );

    let summary_table = if summary.is_empty() {
        "<p>No items to summarize.</p>".to_string()
    } else {
        let rows: String = summary
            .iter()
            .map(|row| {
                format!(
                    "<tr><td>{name}</td><td>{total_in}</td><td>{total_out}</td></tr>",
                    name = escape(&row.name),
                    total_in = row.total_in,
                    total_out = row.total_out,
                )
            })
            .collect();
        format!(
            concat!(
                "<table><thead><tr><th>Item</th><th>Total IN</th>",
                "<th>Total OUT</th></tr></thead><tbody>{rows}</tbody></table>"
            ),
            rows = rows,
        )
    };

    let movements_table = if movements.is_empty() {
        "<p>No movements match the filter.</p>".to_string()
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

    let mut body = format!(
        concat!(
            "<h1>Reports</h1>",
            r#"<div id="export-status"></div>"#,
            r#"<p><a href="/api/reports/summary?format=csv">Download summary CSV</a> "#,
            r#"<button onclick="exportPdf()">Export PDF</button></p>"#,
            "<h2>Movement summary</h2>{summary_table}",
            "<h2>Movements</h2>{filter_form}{movements_table}"
        ),
        summary_table = summary_table,
        filter_form = filter_form,
        movements_table = movements_table,
    );
    body.push_str(SCRIPT);

    Ok(Html(layout("Reports", Some(&user), &body)))
}
