//! Admin pages: user management and the activity log

use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::AdminPage;
use crate::models::Role;
use crate::services::auth::NewUser;
use crate::services::{ActivityService, AuthService};
use crate::web::{error_banner, escape, layout, notice};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UsersPageQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserForm {
    pub username: String,
    pub password: String,
    pub role: Role,
}

pub async fn users_page(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Query(query): Query<UsersPageQuery>,
) -> AppResult<Html<String>> {
    let banner = match (query.status.as_deref(), query.error.as_deref()) {
        (Some("created"), _) => notice("User created."),
        (Some("deleted"), _) => notice("User deleted."),
        (_, Some("missing_fields")) => error_banner("All fields are required."),
        (_, Some("duplicate")) => error_banner("Username already exists."),
        (_, Some("self_delete")) => error_banner("You cannot delete your own account."),
        (_, Some("missing")) => error_banner("User not found."),
        _ => String::new(),
    };

    let users = AuthService::new(state.db.clone(), state.config.auth.bcrypt_cost)
        .list_users()
        .await?;

    let rows: String = users
        .iter()
        .map(|account| {
            let actions = if account.id == user.user_id {
                "<td>(you)</td>".to_string()
            } else {
                format!(
                    concat!(
                        r#"<td class="actions"><form class="inline" method="post" "#,
                        r#"action="/users/{id}/delete" "#,
                        r#"onsubmit="return confirm('Delete this user?')">"#,
                        r#"<button type="submit" class="danger">Delete</button></form></td>"#
                    ),
                    id = account.id,
                )
            };
            format!(
                "<tr><td>{id}</td><td>{username}</td><td>{role}</td><td>{created}</td>{actions}</tr>",
                id = account.id,
                username = escape(&account.username),
                role = account.role.as_str(),
                created = account.created_at.format("%Y-%m-%d"),
                actions = actions,
            )
        })
        .collect();

    let body = format!(
        concat!(
            "<h1>Users</h1>{banner}",
            "<table><thead><tr><th>ID</th><th>Username</th><th>Role</th>",
            "<th>Created</th><th>Actions</th></tr></thead><tbody>{rows}</tbody></table>",
            r#"<fieldset><legend>Create user</legend>"#,
            r#"<form method="post" action="/users/create">"#,
            r#"<label for="username">Username</label><input id="username" name="username">"#,
            r#"<label for="password">Password</label>"#,
            r#"<input id="password" name="password" type="password">"#,
            r#"<label for="role">Role</label>"#,
            r#"<select id="role" name="role">"#,
            r#"<option value="staff">staff</option><option value="admin">admin</option></select>"#,
            r#"<p><button type="submit">Create user</button></p>"#,
            "</form></fieldset>"
        ),
        banner = banner,
        rows = rows,
    );

    Ok(Html(layout("Users", Some(&user), &body)))
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminPage(admin): AdminPage,
    Form(form): Form<UserForm>,
) -> AppResult<Redirect> {
    let auth = AuthService::new(state.db.clone(), state.config.auth.bcrypt_cost);
    let input = NewUser {
        username: form.username,
        password: form.password,
        role: form.role,
    };

    match auth.create_user(&input).await {
        Ok(created) => {
            ActivityService::new(state.db.clone())
                .record(
                    admin.user_id,
                    &format!("Created user {} ({})", created.username, created.role.as_str()),
                )
                .await?;
            Ok(Redirect::to("/users?status=created"))
        }
        Err(AppError::Validation { .. }) => Ok(Redirect::to("/users?error=missing_fields")),
        Err(AppError::Conflict { .. }) => Ok(Redirect::to("/users?error=duplicate")),
        Err(e) => Err(e),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminPage(admin): AdminPage,
    Path(user_id): Path<i64>,
) -> AppResult<Redirect> {
    let auth = AuthService::new(state.db.clone(), state.config.auth.bcrypt_cost);

    match auth.delete_user(admin.user_id, user_id).await {
        Ok(()) => {
            ActivityService::new(state.db.clone())
                .record(admin.user_id, &format!("Deleted user {}", user_id))
                .await?;
            Ok(Redirect::to("/users?status=deleted"))
        }
        Err(AppError::Validation { .. }) => Ok(Redirect::to("/users?error=self_delete")),
        Err(AppError::NotFound(_)) => Ok(Redirect::to("/users?error=missing")),
        Err(e) => Err(e),
    }
}

pub async fn logs_page(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
) -> AppResult<Html<String>> {
    let entries = ActivityService::new(state.db.clone()).list().await?;

    let table = if entries.is_empty() {
        "<p>No activity recorded yet.</p>".to_string()
    } else {
        let rows: String = entries
            .iter()
            .map(|entry| {
                format!(
                    "<tr><td>{when}</td><td>{who}</td><td>{action}</td></tr>",
                    when = entry.created_at.format("%Y-%m-%d %H:%M"),
                    who = escape(&entry.username),
                    action = escape(&entry.action),
                )
            })
            .collect();
        format!(
            concat!(
                "<table><thead><tr><th>When</th><th>User</th>",
                "<th>Action</th></tr></thead><tbody>{rows}</tbody></table>"
            ),
            rows = rows,
        )
    };

    let body = format!("<h1>Activity log</h1>{}", table);
    Ok(Html(layout("Activity log", Some(&user), &body)))
}
