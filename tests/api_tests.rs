mod common;

use axum::http::{header, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use stockroom::models::Role;
use stockroom::services::session::{SessionClaims, SESSION_COOKIE};
use stockroom::AppState;

async fn app_with_users() -> (Router, AppState) {
    let (app, state) = common::test_app().await;
    common::seed_user(&state.db, "boss", "adminpass", "admin").await;
    common::seed_user(&state.db, "clerk", "staffpass", "staff").await;
    (app, state)
}

async fn count(state: &AppState, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&state.db)
        .await
        .unwrap()
}

async fn last_activity(state: &AppState) -> String {
    sqlx::query_scalar("SELECT action FROM activity_log ORDER BY id DESC LIMIT 1")
        .fetch_one(&state.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _state) = common::test_app().await;

    let response = app.oneshot(common::get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn api_requires_a_session() {
    let (app, _state) = common::test_app().await;

    let response = app
        .oneshot(common::get("/api/items", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn pages_redirect_anonymous_visitors_to_login() {
    let (app, _state) = common::test_app().await;

    for uri in ["/dashboard", "/items", "/stock", "/reports", "/settings"] {
        let response = app
            .clone()
            .oneshot(common::get(uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{} should redirect", uri);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}

#[tokio::test]
async fn login_issues_a_session_that_renders_pages() {
    let (app, state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;

    let response = app
        .clone()
        .oneshot(common::get("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response).await.contains("Dashboard"));

    assert_eq!(last_activity(&state).await, "Logged in");
}

#[tokio::test]
async fn wrong_credentials_rerender_the_login_page() {
    let (app, _state) = app_with_users().await;

    let response = app
        .oneshot(common::post_form(
            "/login",
            None,
            "username=clerk&password=wrong",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(common::body_text(response)
        .await
        .contains("Invalid username or password"));
}

#[tokio::test]
async fn remember_me_controls_cookie_persistence() {
    let (app, _state) = app_with_users().await;

    let remembered = app
        .clone()
        .oneshot(common::post_form(
            "/login",
            None,
            "username=clerk&password=staffpass&remember=1",
        ))
        .await
        .unwrap();
    let cookie = remembered.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age="), "remember-me sets an expiry");

    let plain = app
        .clone()
        .oneshot(common::post_form(
            "/login",
            None,
            "username=clerk&password=staffpass",
        ))
        .await
        .unwrap();
    let cookie = plain.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(
        !cookie.contains("Max-Age="),
        "a plain session cookie expires with the browser"
    );
}

#[tokio::test]
async fn authenticated_requests_get_a_refreshed_cookie() {
    let (app, _state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;

    let response = app
        .oneshot(common::get("/items", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let refreshed = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(refreshed.starts_with(&format!("{}=", SESSION_COOKIE)));
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let (app, _state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;

    let response = app
        .oneshot(common::get("/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

fn stale_session_cookie() -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: "1".to_string(),
        username: "boss".to_string(),
        role: Role::Admin,
        remember: false,
        last_active: now - 31 * 60,
        iat: now - 31 * 60,
        exp: now + 3600,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap();
    format!("{}={}", SESSION_COOKIE, token)
}

#[tokio::test]
async fn idle_sessions_are_rejected() {
    let (app, _state) = app_with_users().await;

    let response = app
        .oneshot(common::get("/dashboard", Some(&stale_session_cookie())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn supplier_api_round_trips() {
    let (app, _state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;

    let response = app
        .clone()
        .oneshot(common::post_json(
            "/api/suppliers",
            Some(&cookie),
            json!({"name": "Acme", "contact": "acme@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = common::body_json(response).await;
    assert_eq!(created["name"], "Acme");
    let supplier_id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(common::get("/api/suppliers", Some(&cookie)))
        .await
        .unwrap();
    let listed = common::body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(common::delete(
            &format!("/api/suppliers/{}", supplier_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["status"], "deleted");

    let response = app
        .oneshot(common::delete(
            &format!("/api/suppliers/{}", supplier_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn item_api_creation_applies_defaults_and_joins_suppliers() {
    let (app, _state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;

    let response = app
        .clone()
        .oneshot(common::post_json(
            "/api/suppliers",
            Some(&cookie),
            json!({"name": "Acme"}),
        ))
        .await
        .unwrap();
    let supplier_id = common::body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(common::post_json(
            "/api/items",
            Some(&cookie),
            json!({"name": "Beans", "price": 2.5, "quantity": 3, "supplier_id": supplier_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = common::body_json(response).await;
    assert_eq!(item["reorder_level"], 5, "omitted reorder level defaults");

    let response = app
        .oneshot(common::get("/api/items", Some(&cookie)))
        .await
        .unwrap();
    let items = common::body_json(response).await;
    assert_eq!(items[0]["supplier_name"], "Acme");
}

#[tokio::test]
async fn item_deletion_is_admin_only_and_audited() {
    let (app, state) = app_with_users().await;
    let staff = common::login_cookie(&app, "clerk", "staffpass").await;
    let admin = common::login_cookie(&app, "boss", "adminpass").await;
    let item_id = common::seed_item(&state.db, "Beans", 3, 5).await;

    let response = app
        .clone()
        .oneshot(common::delete(
            &format!("/api/items/{}", item_id),
            Some(&staff),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::body_json(response).await["error"]["code"], "FORBIDDEN");
    assert_eq!(count(&state, "items").await, 1);

    let response = app
        .oneshot(common::delete(
            &format!("/api/items/{}", item_id),
            Some(&admin),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(count(&state, "items").await, 0);
    assert_eq!(last_activity(&state).await, format!("Deleted item {}", item_id));
}

#[tokio::test]
async fn demotion_takes_effect_on_the_next_privileged_request() {
    let (app, state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "boss", "adminpass").await;
    let item_id = common::seed_item(&state.db, "Beans", 3, 5).await;

    sqlx::query("UPDATE users SET role = 'staff' WHERE username = 'boss'")
        .execute(&state.db)
        .await
        .unwrap();

    let response = app
        .oneshot(common::delete(
            &format!("/api/items/{}", item_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(count(&state, "items").await, 1);
}

#[tokio::test]
async fn admin_pages_reject_staff_with_403() {
    let (app, _state) = app_with_users().await;
    let staff = common::login_cookie(&app, "clerk", "staffpass").await;

    let response = app
        .oneshot(common::get("/users", Some(&staff)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(common::body_text(response).await.contains("403 Forbidden"));
}

#[tokio::test]
async fn stock_form_records_a_movement() {
    let (app, state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;
    let item_id = common::seed_item(&state.db, "Beans", 10, 5).await;

    let response = app
        .oneshot(common::post_form(
            "/stock",
            Some(&cookie),
            &format!("item_id={}&delta=-4&note=sold", item_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/stock?status=recorded");

    let quantity: i64 = sqlx::query_scalar("SELECT quantity FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(quantity, 6);

    let (kind, tx_quantity): (String, i64) =
        sqlx::query_as("SELECT kind, quantity FROM stock_transactions ORDER BY id DESC LIMIT 1")
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(kind, "OUT");
    assert_eq!(tx_quantity, 4);
}

#[tokio::test]
async fn malformed_movement_input_writes_nothing() {
    let (app, state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;
    let item_id = common::seed_item(&state.db, "Beans", 10, 5).await;

    let response = app
        .oneshot(common::post_form(
            "/stock",
            Some(&cookie),
            &format!("item_id={}&delta=abc", item_id),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(count(&state, "movements").await, 0);
}

#[tokio::test]
async fn zero_delta_through_the_form_shows_the_error_inline() {
    let (app, state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;
    let item_id = common::seed_item(&state.db, "Beans", 10, 5).await;

    let response = app
        .oneshot(common::post_form(
            "/stock",
            Some(&cookie),
            &format!("item_id={}&delta=0", item_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response)
        .await
        .contains("Delta must be a non-zero integer"));
    assert_eq!(count(&state, "movements").await, 0);
}

#[tokio::test]
async fn admin_item_edit_goes_through_the_ledger() {
    let (app, state) = app_with_users().await;
    let admin = common::login_cookie(&app, "boss", "adminpass").await;
    let staff = common::login_cookie(&app, "clerk", "staffpass").await;
    let item_id = common::seed_item(&state.db, "Beans", 10, 5).await;

    // Staff cannot reach the edit form at all.
    let response = app
        .clone()
        .oneshot(common::get(&format!("/items/{}/edit", item_id), Some(&staff)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(common::post_form(
            &format!("/items/{}/edit", item_id),
            Some(&admin),
            "name=Beans&sku=&price=2.5&quantity=4&reorder_level=5",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/items?status=updated");

    let (quantity, price): (i64, f64) =
        sqlx::query_as("SELECT quantity, price FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(quantity, 4);
    assert_eq!(price, 2.5);

    let (delta, note): (i64, String) =
        sqlx::query_as("SELECT delta, note FROM movements ORDER BY id DESC LIMIT 1")
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(delta, -6);
    assert_eq!(note, "Adjusted via item edit");
    assert_eq!(last_activity(&state).await, format!("Updated item {}", item_id));
}

#[tokio::test]
async fn register_creates_a_staff_account() {
    let (app, state) = common::test_app().await;

    let response = app
        .clone()
        .oneshot(common::post_form(
            "/register",
            None,
            "username=newbie&password=pw",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login?registered=1");

    let role: String = sqlx::query_scalar("SELECT role FROM users WHERE username = 'newbie'")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(role, "staff");
    assert_eq!(last_activity(&state).await, "Registered account");

    let response = app
        .oneshot(common::post_form(
            "/register",
            None,
            "username=newbie&password=pw",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response)
        .await
        .contains("Username already exists."));
}

#[tokio::test]
async fn password_change_flow() {
    let (app, _state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;

    let response = app
        .clone()
        .oneshot(common::post_form(
            "/settings/password",
            Some(&cookie),
            "new_password=abc&confirm_password=xyz",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response)
        .await
        .contains("Passwords do not match."));

    let response = app
        .clone()
        .oneshot(common::post_form(
            "/settings/password",
            Some(&cookie),
            "new_password=fresh-secret&confirm_password=fresh-secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    common::login_cookie(&app, "clerk", "fresh-secret").await;
}

#[tokio::test]
async fn admin_reset_clears_inventory_and_keeps_accounts() {
    let (app, state) = app_with_users().await;
    let staff = common::login_cookie(&app, "clerk", "staffpass").await;
    let admin = common::login_cookie(&app, "boss", "adminpass").await;
    let item_id = common::seed_item(&state.db, "Beans", 10, 5).await;
    app.clone()
        .oneshot(common::post_form(
            "/stock",
            Some(&staff),
            &format!("item_id={}&delta=2", item_id),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(common::post_form("/settings/reset", Some(&staff), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(common::post_form("/settings/reset", Some(&admin), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/settings?status=reset");

    for table in ["items", "suppliers", "movements", "stock_transactions"] {
        assert_eq!(count(&state, table).await, 0, "{} should be cleared", table);
    }
    assert_eq!(count(&state, "users").await, 2);
    assert_eq!(last_activity(&state).await, "Reset database");
}

#[tokio::test]
async fn legacy_migration_endpoint_reports_the_count() {
    let (app, state) = app_with_users().await;
    let admin = common::login_cookie(&app, "boss", "adminpass").await;

    use sha2::{Digest, Sha256};
    let digest: String = Sha256::digest(b"oldpass")
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    sqlx::query(
        "INSERT INTO users (username, password_hash, role, created_at) \
         VALUES ('legacy', $1, 'staff', $2)",
    )
    .bind(&digest)
    .bind(chrono::Utc::now())
    .execute(&state.db)
    .await
    .unwrap();

    let response = app
        .oneshot(common::post_form(
            "/settings/migrate-legacy",
            Some(&admin),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/settings?status=migrated&count=1"
    );
    assert_eq!(last_activity(&state).await, "Migrated 1 legacy credentials");
}

#[tokio::test]
async fn report_endpoints_serve_json_csv_and_pdf() {
    let (app, state) = app_with_users().await;
    let cookie = common::login_cookie(&app, "clerk", "staffpass").await;
    let item_id = common::seed_item(&state.db, "Beans", 0, 5).await;
    app.clone()
        .oneshot(common::post_form(
            "/stock",
            Some(&cookie),
            &format!("item_id={}&delta=7", item_id),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(common::get("/api/reports/summary", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = common::body_json(response).await;
    assert_eq!(summary[0]["name"], "Beans");
    assert_eq!(summary[0]["total_in"], 7);

    let response = app
        .clone()
        .oneshot(common::get(
            "/api/reports/summary?format=csv",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("attachment"));
    assert!(common::body_text(response)
        .await
        .starts_with("item_id,name,total_in,total_out"));

    let response = app
        .clone()
        .oneshot(common::get("/api/reports/low-stock", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/reports/export")
                .header(header::COOKIE, &cookie)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = common::body_json(response).await;
    assert_eq!(receipt["status"], "ok");
    let path = receipt["path"].as_str().unwrap().to_string();
    assert!(std::path::Path::new(&path).exists());

    std::fs::remove_dir_all(&state.config.reports.output_dir).ok();
}
