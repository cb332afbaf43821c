//! Supplier directory page, driven by the JSON API

use axum::{extract::State, response::Html};

use crate::error::AppResult;
use crate::middleware::PageUser;
use crate::services::SupplierService;
use crate::web::{escape, layout};
use crate::AppState;

const SCRIPT: &str = r#"<script>
async function createSupplier(event) {
    event.preventDefault();
    const name = document.getElementById('name').value.trim();
    const contact = document.getElementById('contact').value.trim();
    if (!name) return;
    await fetch('/api/suppliers', {
        method: 'POST',
        headers: {'Content-Type': 'application/json'},
        body: JSON.stringify({name: name, contact: contact || null}),
    });
    location.reload();
}
async function deleteSupplier(id) {
    if (!confirm('Delete this supplier?')) return;
    await fetch('/api/suppliers/' + id, {method: 'DELETE'});
    location.reload();
}
</script>"#;

pub async fn suppliers_page(
    State(state): State<AppState>,
    PageUser(user): PageUser,
) -> AppResult<Html<String>> {
    let suppliers = SupplierService::new(state.db.clone()).list().await?;

    let table = if suppliers.is_empty() {
        "<p>No suppliers yet.</p>".to_string()
    } else {
        let rows: String = suppliers
            .iter()
            .map(|s| {
                format!(
                    concat!(
                        "<tr><td>{id}</td><td>{name}</td><td>{contact}</td>",
                        r#"<td class="actions"><button class="danger" "#,
                        r#"onclick="deleteSupplier({id})">Delete</button></td></tr>"#
                    ),
                    id = s.id,
                    name = escape(&s.name),
                    contact = escape(s.contact.as_deref().unwrap_or("-")),
                )
            })
            .collect();
        format!(
            concat!(
                "<table><thead><tr><th>ID</th><th>Name</th>",
                "<th>Contact</th><th>Actions</th></tr></thead>",
                "<tbody>{rows}</tbody></table>"
            ),
            rows = rows,
        )
    };

    let mut body = format!(
        concat!(
            "<h1>Suppliers</h1>{table}",
            r#"<fieldset><legend>Add supplier</legend>"#,
            r#"<form onsubmit="createSupplier(event)">"#,
            r#"<label for="name">Name</label><input id="name" required>"#,
            r#"<label for="contact">Contact</label><input id="contact">"#,
            r#"<p><button type="submit">Add supplier</button></p>"#,
            "</form></fieldset>"
        ),
        table = table,
    );
    body.push_str(SCRIPT);

    Ok(Html(layout("Suppliers", Some(&user), &body)))
}
