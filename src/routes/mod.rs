//! Route tables for the JSON API and the HTML surface

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::web;
use crate::AppState;

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route("/:supplier_id", delete(handlers::suppliers::delete_supplier))
}

fn item_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route("/:item_id", delete(handlers::items::delete_item))
}

fn movement_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::movements::list_movements))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/low-stock", get(handlers::reports::low_stock))
        .route("/summary", get(handlers::reports::movement_summary))
        .route("/export", post(handlers::reports::export_pdf))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/suppliers", supplier_routes())
        .nest("/items", item_routes())
        .nest("/movements", movement_routes())
        .nest("/reports", report_routes())
}

pub fn web_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(web::auth::root))
        .route("/login", get(web::auth::login_page).post(web::auth::login_submit))
        .route("/logout", get(web::auth::logout))
        .route(
            "/register",
            get(web::auth::register_page).post(web::auth::register_submit),
        )
        .route("/dashboard", get(web::dashboard::dashboard_page))
        .route("/items", get(web::items::items_page))
        .route("/items/create", post(web::items::create_item))
        .route(
            "/items/:item_id/edit",
            get(web::items::edit_item_page).post(web::items::edit_item_submit),
        )
        .route("/items/:item_id/delete", post(web::items::delete_item))
        .route(
            "/stock",
            get(web::stock::stock_page).post(web::stock::record_movement),
        )
        .route("/suppliers", get(web::suppliers::suppliers_page))
        .route("/reports", get(web::reports::reports_page))
        .route("/settings", get(web::settings::settings_page))
        .route("/settings/password", post(web::settings::change_password))
        .route("/settings/reset", post(web::settings::reset_data))
        .route("/settings/migrate-legacy", post(web::settings::migrate_legacy))
        .route("/users", get(web::admin::users_page))
        .route("/users/create", post(web::admin::create_user))
        .route("/users/:user_id/delete", post(web::admin::delete_user))
        .route("/logs", get(web::admin::logs_page))
}
