#![allow(dead_code)]

use std::str::FromStr;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tower::ServiceExt;

use stockroom::config::{AuthConfig, Config, DatabaseConfig, ReportsConfig, ServerConfig};
use stockroom::{create_app, store, AppState};

/// Single-connection in-memory pool with the schema applied
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    store::init(&pool).await.unwrap();
    pool
}

pub fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 5,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            session_secret: "test-secret".to_string(),
            idle_timeout_minutes: 30,
            remember_days: 30,
            bcrypt_cost: 4,
            bootstrap_password: None,
        },
        reports: ReportsConfig {
            output_dir: std::env::temp_dir()
                .join(format!("stockroom-test-reports-{}", std::process::id()))
                .to_string_lossy()
                .into_owned(),
        },
    }
}

pub async fn test_state() -> AppState {
    AppState::new(memory_pool().await, test_config())
}

pub async fn test_app() -> (Router, AppState) {
    let state = test_state().await;
    (create_app(state.clone()), state)
}

pub async fn seed_user(pool: &SqlitePool, username: &str, password: &str, role: &str) -> i64 {
    let hash = bcrypt::hash(password, 4).unwrap();
    sqlx::query_scalar(
        "INSERT INTO users (username, password_hash, role, created_at) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(username)
    .bind(hash)
    .bind(role)
    .bind(chrono::Utc::now())
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_item(pool: &SqlitePool, name: &str, quantity: i64, reorder_level: i64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO items (name, price, quantity, reorder_level) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(name)
    .bind(1.0_f64)
    .bind(quantity)
    .bind(reorder_level)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Log in through the HTTP surface and return the `name=value` session
/// cookie pair.
pub async fn login_cookie(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            None,
            &format!("username={}&password={}", username, password),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_json(uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn delete(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
