mod support;

use axum::http::StatusCode;
use serde_json::{json, Value};
use support::{get, post_json, sale_body, TestApp};

fn signup(username: &str, password: &str, role: &str) -> Value {
    json!({"username": username, "password": password, "role": role})
}

#[tokio::test]
async fn signup_returns_account_without_secret() {
    let app = TestApp::setup().await;

    let (status, body) = app
        .send(post_json("/api/signup", None, &signup("erin", "s3cret", "employee")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["username"], "erin");
    assert_eq!(body["role"], "employee");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE username = 'erin'")
        .fetch_one(&app.pool)
        .await
        .expect("row");
    assert_ne!(stored, "s3cret");
    assert!(stored.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = TestApp::setup().await;
    app.send(post_json("/api/signup", None, &signup("erin", "one", "employee")))
        .await;

    let (status, body) = app
        .send(post_json("/api/signup", None, &signup("erin", "two", "manager")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"error": "Username already exists"}));
}

#[tokio::test]
async fn signup_rejects_unknown_role_and_missing_fields() {
    let app = TestApp::setup().await;

    let (status, body) = app
        .send(post_json("/api/signup", None, &signup("olga", "pw", "owner")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Unsupported role 'owner'. Allowed roles: manager, employee"
    );

    let (status, _) = app
        .send(post_json("/api/signup", None, &signup("", "pw", "employee")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&app.pool)
        .await
        .expect("count");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn login_token_opens_the_sales_endpoints() {
    let app = TestApp::setup().await;
    app.send(post_json("/api/signup", None, &signup("erin", "s3cret", "employee")))
        .await;

    let (status, body) = app
        .send(post_json(
            "/api/login",
            None,
            &json!({"username": "erin", "password": "s3cret"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "erin");
    assert_eq!(body["role"], "employee");
    let token = body["token"].as_str().expect("token").to_string();

    app.record_sale(&token, sale_body("2024-04-02", "Pretzel", 2, 3.5)).await;
    let (status, sales) = app.send(get("/api/sales/my", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales[0]["employee_id"], body["user_id"]);
    assert_eq!(sales[0]["total_price"].as_f64(), Some(7.0));
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = TestApp::setup().await;
    app.send(post_json("/api/signup", None, &signup("erin", "s3cret", "employee")))
        .await;

    for credentials in [
        json!({"username": "erin", "password": "wrong"}),
        json!({"username": "nobody", "password": "s3cret"}),
    ] {
        let (status, body) = app.send(post_json("/api/login", None, &credentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Invalid username or password"}));
    }
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let app = TestApp::setup().await;

    let (status, body) = app.send(get("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "service": "PrepSheet Backend"}));
}

#[tokio::test]
async fn metrics_count_sales_and_logins() {
    let app = TestApp::setup().await;
    app.send(post_json("/api/signup", None, &signup("erin", "s3cret", "employee")))
        .await;
    let (_, login) = app
        .send(post_json(
            "/api/login",
            None,
            &json!({"username": "erin", "password": "s3cret"}),
        ))
        .await;
    let token = login["token"].as_str().expect("token");
    app.record_sale(token, sale_body("2024-04-02", "Pretzel", 1, 3.5)).await;

    let (status, body) = app.send(get("/metrics", None)).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("text exposition");
    assert!(text.contains("auth_login_attempts_total{outcome=\"success\"} 1"));
    assert!(text.contains("sales_recorded_total 1"));
}
