//! Session cookie middleware and request guards

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::AppError;
use crate::models::Role;
use crate::services::session::{SessionUser, SESSION_COOKIE};
use crate::AppState;

/// Build the session cookie. Remember-me sessions persist via Max-Age;
/// others last until the browser closes.
pub fn session_cookie(token: String, remember: bool, remember_days: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    if remember {
        cookie.set_max_age(time::Duration::days(remember_days));
    }
    cookie
}

/// A cookie matching the session cookie's scope, for removal
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Validate the session cookie, attach the principal to the request, and
/// re-issue the refreshed cookie after the handler runs. Never rejects:
/// the guards below decide what an anonymous request may do.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let mut refreshed: Option<(String, bool)> = None;

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match state.sessions.validate(cookie.value()) {
            Ok((user, token)) => {
                refreshed = Some((token, user.remember));
                request.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!("Session rejected: {}", e);
            }
        }
    }

    let response = next.run(request).await;

    // Login and logout set their own cookie; leave those responses alone.
    if let Some((token, remember)) = refreshed {
        if !response.headers().contains_key(header::SET_COOKIE) {
            let jar = CookieJar::new().add(session_cookie(
                token,
                remember,
                state.config.auth.remember_days,
            ));
            return (jar, response).into_response();
        }
    }

    response
}

/// Session principal for API handlers. Missing or expired sessions are a
/// JSON 401.
pub struct CurrentUser(pub SessionUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Session principal for HTML pages. Anonymous visitors are redirected to
/// the login page.
pub struct PageUser(pub SessionUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for PageUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .map(PageUser)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Admin principal for API handlers. The role is re-read from the store,
/// so demotion or deletion takes effect on the next privileged request.
pub struct CurrentAdmin(pub SessionUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
        require_admin(state, &user).await?;
        Ok(CurrentAdmin(user))
    }
}

/// Admin principal for HTML pages: anonymous visitors go to the login
/// page, authenticated non-admins get a 403.
pub struct AdminPage(pub SessionUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminPage {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(user) = parts.extensions.get::<SessionUser>().cloned() else {
            return Err(Redirect::to("/login").into_response());
        };

        match require_admin(state, &user).await {
            Ok(()) => Ok(AdminPage(user)),
            Err(AppError::Forbidden(_)) => Err((
                StatusCode::FORBIDDEN,
                "403 Forbidden: administrator access required",
            )
                .into_response()),
            Err(other) => Err(other.into_response()),
        }
    }
}

async fn require_admin(state: &AppState, user: &SessionUser) -> Result<(), AppError> {
    let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?;

    match role {
        Some(Role::Admin) => Ok(()),
        _ => Err(AppError::Forbidden(
            "Administrator access required".to_string(),
        )),
    }
}
