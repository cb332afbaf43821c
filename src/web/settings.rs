//! Account settings and admin maintenance actions

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::{AdminPage, PageUser};
use crate::models::Role;
use crate::services::session::SessionUser;
use crate::services::{ActivityService, AuthService};
use crate::store;
use crate::web::{error_banner, layout, notice};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    pub status: Option<String>,
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

fn render_settings_page(user: &SessionUser, banner: &str) -> Html<String> {
    let password_form = concat!(
        r#"<fieldset><legend>Change password</legend>"#,
        r#"<form method="post" action="/settings/password">"#,
        r#"<label for="new_password">New password</label>"#,
        r#"<input id="new_password" name="new_password" type="password">"#,
        r#"<label for="confirm_password">Confirm password</label>"#,
        r#"<input id="confirm_password" name="confirm_password" type="password">"#,
        r#"<p><button type="submit">Change password</button></p>"#,
        "</form></fieldset>"
    );

    let admin_section = if user.role == Role::Admin {
        concat!(
            r#"<h2>Maintenance</h2>"#,
            r#"<fieldset><legend>Legacy credentials</legend>"#,
            "<p>Wrap any remaining unsalted password digests in bcrypt.</p>",
            r#"<form method="post" action="/settings/migrate-legacy">"#,
            r#"<button type="submit">Migrate legacy credentials</button></form></fieldset>"#,
            r#"<fieldset><legend>Danger zone</legend>"#,
            "<p>Deletes all suppliers, items and stock history. Accounts are kept.</p>",
            r#"<form method="post" action="/settings/reset" "#,
            r#"onsubmit="return confirm('Really delete all inventory data?')">"#,
            r#"<button type="submit" class="danger">Reset data</button></form></fieldset>"#
        )
    } else {
        ""
    };

    let body = format!(
        "<h1>Settings</h1>{banner}{password_form}{admin_section}",
        banner = banner,
        password_form = password_form,
        admin_section = admin_section,
    );
    Html(layout("Settings", Some(user), &body))
}

pub async fn settings_page(
    PageUser(user): PageUser,
    Query(query): Query<SettingsQuery>,
) -> Html<String> {
    let banner = match query.status.as_deref() {
        Some("password_changed") => notice("Password updated."),
        Some("reset") => notice("All inventory data has been reset."),
        Some("migrated") => notice(&format!(
            "Migrated {} legacy credentials.",
            query.count.unwrap_or(0)
        )),
        _ => String::new(),
    };
    render_settings_page(&user, &banner)
}

pub async fn change_password(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Form(form): Form<PasswordForm>,
) -> AppResult<Response> {
    if form.new_password.is_empty() || form.new_password != form.confirm_password {
        return Ok(
            render_settings_page(&user, &error_banner("Passwords do not match.")).into_response(),
        );
    }

    AuthService::new(state.db.clone(), state.config.auth.bcrypt_cost)
        .change_password(user.user_id, &form.new_password)
        .await?;
    ActivityService::new(state.db.clone())
        .record(user.user_id, "Changed password")
        .await?;

    Ok(Redirect::to("/settings?status=password_changed").into_response())
}

pub async fn reset_data(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
) -> AppResult<Redirect> {
    store::reset_data(&state.db).await?;
    ActivityService::new(state.db.clone())
        .record(user.user_id, "Reset database")
        .await?;
    Ok(Redirect::to("/settings?status=reset"))
}

pub async fn migrate_legacy(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
) -> AppResult<Redirect> {
    let migrated = AuthService::new(state.db.clone(), state.config.auth.bcrypt_cost)
        .migrate_legacy_credentials()
        .await?;
    ActivityService::new(state.db.clone())
        .record(
            user.user_id,
            &format!("Migrated {} legacy credentials", migrated),
        )
        .await?;
    Ok(Redirect::to(&format!(
        "/settings?status=migrated&count={}",
        migrated
    )))
}
