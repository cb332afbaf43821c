//! Item catalog pages and the admin edit flow

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::{AdminPage, PageUser};
use crate::models::{Item, Role};
use crate::services::items::{ItemUpdate, NewItem, DEFAULT_REORDER_LEVEL};
use crate::services::session::SessionUser;
use crate::services::{ActivityService, ItemService, SupplierService};
use crate::web::{empty_string_as_none, error_banner, escape, layout, notice};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ItemsPageQuery {
    pub status: Option<String>,
}

/// Lenient create form: cleared numeric inputs fall back to defaults
#[derive(Debug, Deserialize)]
pub struct ItemCreateForm {
    pub name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub reorder_level: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub supplier_id: Option<i64>,
}

/// Strict edit form: every field is present on the form, so a malformed
/// value is rejected before anything is written
#[derive(Debug, Deserialize)]
pub struct ItemEditForm {
    pub name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sku: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub reorder_level: i64,
}

async fn render_items_page(
    state: &AppState,
    user: &SessionUser,
    banner: &str,
) -> AppResult<Html<String>> {
    let items = ItemService::new(state.db.clone()).list_with_suppliers().await?;
    let suppliers = SupplierService::new(state.db.clone()).list().await?;
    let is_admin = user.role == Role::Admin;

    let mut rows = String::new();
    for item in &items {
        let quantity_cell = if item.quantity <= item.reorder_level {
            format!(r#"<td class="low">{}</td>"#, item.quantity)
        } else {
            format!("<td>{}</td>", item.quantity)
        };
        let actions = if is_admin {
            format!(
                concat!(
                    r#"<td class="actions"><a href="/items/{id}/edit">Edit</a> "#,
                    r#"<form class="inline" method="post" action="/items/{id}/delete" "#,
                    r#"onsubmit="return confirm('Delete this item?')">"#,
                    r#"<button type="submit" class="danger">Delete</button></form></td>"#
                ),
                id = item.id,
            )
        } else {
            String::new()
        };
        rows.push_str(&format!(
            concat!(
                "<tr><td>{id}</td><td>{name}</td><td>{sku}</td>",
                "<td>{price:.2}</td>{quantity_cell}<td>{reorder}</td>",
                "<td>{supplier}</td>{actions}</tr>"
            ),
            id = item.id,
            name = escape(&item.name),
            sku = escape(item.sku.as_deref().unwrap_or("-")),
            price = item.price,
            quantity_cell = quantity_cell,
            reorder = item.reorder_level,
            supplier = escape(item.supplier_name.as_deref().unwrap_or("-")),
            actions = actions,
        ));
    }

    let actions_header = if is_admin { "<th>Actions</th>" } else { "" };
    let table = if items.is_empty() {
        "<p>No items yet.</p>".to_string()
    } else {
        format!(
            concat!(
                "<table><thead><tr><th>ID</th><th>Name</th><th>SKU</th>",
                "<th>Price</th><th>Quantity</th><th>Reorder level</th>",
                "<th>Supplier</th>{actions_header}</tr></thead>",
                "<tbody>{rows}</tbody></table>"
            ),
            actions_header = actions_header,
            rows = rows,
        )
    };

    let supplier_options: String = suppliers
        .iter()
        .map(|s| format!(r#"<option value="{}">{}</option>"#, s.id, escape(&s.name)))
        .collect();

    let create_form = format!(
        concat!(
            r#"<fieldset><legend>Add item</legend>"#,
            r#"<form method="post" action="/items/create">"#,
            r#"<label for="name">Name</label><input id="name" name="name" required>"#,
            r#"<label for="sku">SKU</label><input id="sku" name="sku">"#,
            r#"<label for="price">Price</label>"#,
            r#"<input id="price" name="price" type="number" step="0.01" min="0" placeholder="0.00">"#,
            r#"<label for="quantity">Initial quantity</label>"#,
            r#"<input id="quantity" name="quantity" type="number" min="0" placeholder="0">"#,
            r#"<label for="reorder_level">Reorder level</label>"#,
            r#"<input id="reorder_level" name="reorder_level" type="number" min="0" placeholder="{default_reorder}">"#,
            r#"<label for="description">Description</label>"#,
            r#"<input id="description" name="description">"#,
            r#"<label for="supplier_id">Supplier</label>"#,
            r#"<select id="supplier_id" name="supplier_id"><option value="">None</option>{options}</select>"#,
            r#"<p><button type="submit">Add item</button></p>"#,
            "</form></fieldset>"
        ),
        default_reorder = DEFAULT_REORDER_LEVEL,
        options = supplier_options,
    );

    let body = format!(
        "<h1>Items</h1>{banner}{table}{create_form}",
        banner = banner,
        table = table,
        create_form = create_form,
    );

    Ok(Html(layout("Items", Some(user), &body)))
}

pub async fn items_page(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Query(query): Query<ItemsPageQuery>,
) -> AppResult<Html<String>> {
    let banner = match query.status.as_deref() {
        Some("created") => notice("Item created."),
        Some("updated") => notice("Item updated."),
        Some("deleted") => notice("Item deleted."),
        _ => String::new(),
    };
    render_items_page(&state, &user, &banner).await
}

pub async fn create_item(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Form(form): Form<ItemCreateForm>,
) -> AppResult<Response> {
    let input = NewItem {
        name: form.name,
        sku: form.sku,
        price: form.price.unwrap_or(0.0),
        quantity: form.quantity.unwrap_or(0),
        reorder_level: form.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL),
        description: form.description,
        supplier_id: form.supplier_id,
    };

    match ItemService::new(state.db.clone()).create(&input).await {
        Ok(_) => Ok(Redirect::to("/items?status=created").into_response()),
        Err(AppError::Validation { message, .. }) => Ok(render_items_page(
            &state,
            &user,
            &error_banner(&message),
        )
        .await?
        .into_response()),
        Err(e) => Err(e),
    }
}

fn render_edit_page(user: &SessionUser, item: &Item, banner: &str) -> Html<String> {
    let body = format!(
        concat!(
            "<h1>Edit item {id}</h1>{banner}",
            r#"<fieldset><legend>Item details</legend>"#,
            r#"<form method="post" action="/items/{id}/edit">"#,
            r#"<label for="name">Name</label><input id="name" name="name" value="{name}" required>"#,
            r#"<label for="sku">SKU</label><input id="sku" name="sku" value="{sku}">"#,
            r#"<label for="price">Price</label>"#,
            r#"<input id="price" name="price" type="number" step="0.01" min="0" value="{price}" required>"#,
            r#"<label for="quantity">Quantity</label>"#,
            r#"<input id="quantity" name="quantity" type="number" value="{quantity}" required>"#,
            r#"<label for="reorder_level">Reorder level</label>"#,
            r#"<input id="reorder_level" name="reorder_level" type="number" min="0" value="{reorder}" required>"#,
            r#"<p><button type="submit">Save</button> <a href="/items">Cancel</a></p>"#,
            "</form></fieldset>",
            "<p>A changed quantity is recorded as a stock movement.</p>"
        ),
        id = item.id,
        banner = banner,
        name = escape(&item.name),
        sku = escape(item.sku.as_deref().unwrap_or("")),
        price = item.price,
        quantity = item.quantity,
        reorder = item.reorder_level,
    );
    Html(layout("Edit item", Some(user), &body))
}

pub async fn edit_item_page(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Path(item_id): Path<i64>,
) -> AppResult<Html<String>> {
    let item = ItemService::new(state.db.clone()).get(item_id).await?;
    Ok(render_edit_page(&user, &item, ""))
}

pub async fn edit_item_submit(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Path(item_id): Path<i64>,
    Form(form): Form<ItemEditForm>,
) -> AppResult<Response> {
    let service = ItemService::new(state.db.clone());
    let input = ItemUpdate {
        name: form.name,
        sku: form.sku,
        price: form.price,
        quantity: form.quantity,
        reorder_level: form.reorder_level,
    };

    match service.update(item_id, &input).await {
        Ok(_) => {
            ActivityService::new(state.db.clone())
                .record(user.user_id, &format!("Updated item {}", item_id))
                .await?;
            Ok(Redirect::to("/items?status=updated").into_response())
        }
        Err(AppError::Validation { message, .. }) => {
            let item = service.get(item_id).await?;
            Ok(render_edit_page(&user, &item, &error_banner(&message)).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_item(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Path(item_id): Path<i64>,
) -> AppResult<Redirect> {
    ItemService::new(state.db.clone()).delete(item_id).await?;
    ActivityService::new(state.db.clone())
        .record(user.user_id, &format!("Deleted item {}", item_id))
        .await?;
    Ok(Redirect::to("/items?status=deleted"))
}
