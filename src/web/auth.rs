//! Login, logout and self-service registration pages

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::session::{clear_session_cookie, session_cookie};
use crate::middleware::PageUser;
use crate::services::auth::Credentials;
use crate::services::{ActivityService, AuthService};
use crate::web::{error_banner, layout, notice};
use crate::AppState;

pub async fn root(user: Option<PageUser>) -> Redirect {
    match user {
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/login"),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub registered: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub remember: Option<String>,
}

fn render_login(banner: &str) -> Html<String> {
    let body = format!(
        concat!(
            "<h1>Log in</h1>{banner}",
            r#"<fieldset><legend>Sign in to Stockroom</legend>"#,
            r#"<form method="post" action="/login">"#,
            r#"<label for="username">Username</label>"#,
            r#"<input id="username" name="username" autofocus>"#,
            r#"<label for="password">Password</label>"#,
            r#"<input id="password" name="password" type="password">"#,
            r#"<label><input type="checkbox" name="remember" value="1"> Remember me</label>"#,
            r#"<p><button type="submit">Log in</button></p>"#,
            "</form></fieldset>",
            r#"<p>No account? <a href="/register">Register</a>.</p>"#
        ),
        banner = banner,
    );
    Html(layout("Log in", None, &body))
}

pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Html<String> {
    let banner = if query.registered.is_some() {
        notice("Account created. Please sign in.")
    } else {
        String::new()
    };
    render_login(&banner)
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let auth = AuthService::new(state.db.clone(), state.config.auth.bcrypt_cost);
    let remember = form.remember.is_some();
    let credentials = Credentials {
        username: form.username,
        password: form.password,
    };

    match auth.login(&credentials).await {
        Ok(user) => {
            let token = state
                .sessions
                .issue(user.id, &user.username, user.role, remember)?;
            ActivityService::new(state.db.clone())
                .record(user.id, "Logged in")
                .await?;

            let jar = jar.add(session_cookie(
                token,
                remember,
                state.config.auth.remember_days,
            ));
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        // A wrong password and an unknown user read the same on the page.
        Err(AppError::InvalidCredentials) | Err(AppError::Validation { .. }) => {
            Ok(render_login(&error_banner("Invalid username or password")).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(clear_session_cookie()), Redirect::to("/login"))
}

fn render_register(banner: &str) -> Html<String> {
    let body = format!(
        concat!(
            "<h1>Register</h1>{banner}",
            r#"<fieldset><legend>Create an account</legend>"#,
            r#"<form method="post" action="/register">"#,
            r#"<label for="username">Username</label>"#,
            r#"<input id="username" name="username" autofocus>"#,
            r#"<label for="password">Password</label>"#,
            r#"<input id="password" name="password" type="password">"#,
            r#"<p><button type="submit">Register</button></p>"#,
            "</form></fieldset>",
            r#"<p>Already registered? <a href="/login">Log in</a>.</p>"#
        ),
        banner = banner,
    );
    Html(layout("Register", None, &body))
}

pub async fn register_page() -> Html<String> {
    render_register("")
}

pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<Credentials>,
) -> AppResult<Response> {
    let auth = AuthService::new(state.db.clone(), state.config.auth.bcrypt_cost);

    match auth.register(&form).await {
        Ok(user) => {
            ActivityService::new(state.db.clone())
                .record(user.id, "Registered account")
                .await?;
            Ok(Redirect::to("/login?registered=1").into_response())
        }
        Err(AppError::Validation { .. }) => {
            Ok(render_register(&error_banner("All fields are required.")).into_response())
        }
        Err(AppError::Conflict { .. }) => {
            Ok(render_register(&error_banner("Username already exists.")).into_response())
        }
        Err(e) => Err(e),
    }
}
