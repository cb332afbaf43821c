use axum::{extract::State, response::Html};

use crate::error::AppResult;
use crate::middleware::PageUser;
use crate::models::Role;
use crate::services::ReportsService;
use crate::web::{escape, layout};
use crate::AppState;

pub async fn dashboard_page(
    State(state): State<AppState>,
    PageUser(user): PageUser,
) -> AppResult<Html<String>> {
    let reports = ReportsService::new(state.db.clone());
    let metrics = reports.dashboard_metrics(user.role == Role::Admin).await?;
    let low_stock = reports.low_stock().await?;

    let mut cards = format!(
        concat!(
            r#"<div class="cards">"#,
            r#"<div class="card"><div class="value">{items}</div><div class="label">Items</div></div>"#,
            r#"<div class="card"><div class="value">{quantity}</div><div class="label">Units on hand</div></div>"#,
            r#"<div class="card"><div class="value">{transactions}</div><div class="label">Stock transactions</div></div>"#
        ),
        items = metrics.total_items,
        quantity = metrics.total_quantity,
        transactions = metrics.total_transactions,
    );
    if let Some(user_count) = metrics.user_count {
        cards.push_str(&format!(
            r#"<div class="card"><div class="value">{}</div><div class="label">Users</div></div>"#,
            user_count
        ));
    }
    cards.push_str("</div>");

    let low_section = if low_stock.is_empty() {
        "<p>No items are at or below their reorder level.</p>".to_string()
    } else {
        let rows: String = low_stock
            .iter()
            .map(|item| {
                format!(
                    concat!(
                        "<tr><td>{id}</td><td>{name}</td>",
                        r#"<td class="low">{quantity}</td><td>{reorder}</td></tr>"#
                    ),
                    id = item.id,
                    name = escape(&item.name),
                    quantity = item.quantity,
                    reorder = item.reorder_level,
                )
            })
            .collect();
        format!(
            concat!(
                "<table><thead><tr><th>ID</th><th>Name</th>",
                "<th>Quantity</th><th>Reorder level</th></tr></thead>",
                "<tbody>{rows}</tbody></table>"
            ),
            rows = rows,
        )
    };

    let body = format!(
        "<h1>Dashboard</h1>{cards}<h2>Low stock</h2>{low_section}",
        cards = cards,
        low_section = low_section,
    );

    Ok(Html(layout("Dashboard", Some(&user), &body)))
}
