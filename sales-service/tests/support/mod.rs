#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use common_auth::{JwtConfig, JwtVerifier, Role};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sales_service::metrics::SalesMetrics;
use sales_service::tokens::{TokenConfig, TokenSigner};
use sales_service::{build_router, db, repo, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

impl TestApp {
    pub async fn setup() -> Self {
        // One connection keeps every query on the same in-memory database.
        let pool = db::connect("sqlite::memory:", 1).await.expect("connect");
        db::run_migrations(&pool).await.expect("migrations");

        let verifier = JwtVerifier::new(JwtConfig::new(TEST_SECRET)).expect("verifier");
        let signer = TokenSigner::new(TokenConfig {
            secret: TEST_SECRET.to_string(),
            ttl_seconds: 3600,
        })
        .expect("signer");
        let metrics = SalesMetrics::new().expect("metrics");

        let state = AppState::new(pool.clone(), verifier, signer, metrics);
        Self {
            router: build_router(state),
            pool,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    /// Inserts a user row directly and returns a valid bearer token for it.
    pub async fn seed_user(&self, username: &str, role: Role) -> SeededUser {
        let row = repo::insert_user(&self.pool, username, "not-a-real-hash", role.as_str())
            .await
            .expect("seed user");
        SeededUser {
            user_id: row.id,
            token: token_for(row.id, username, role, 600),
        }
    }

    pub async fn sale_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await
            .expect("count")
    }

    /// Records a sale through the API as the given employee and returns its id.
    pub async fn record_sale(&self, token: &str, body: Value) -> i64 {
        let (status, response) = self.send(post_json("/api/sales", Some(token), &body)).await;
        assert_eq!(status, StatusCode::CREATED, "{response}");
        response["sale_id"].as_i64().expect("sale_id")
    }
}

pub struct SeededUser {
    pub user_id: i64,
    pub token: String,
}

pub fn token_for(user_id: i64, username: &str, role: Role, expires_in: i64) -> String {
    let now = Utc::now().timestamp();
    encode(
        &Header::default(),
        &json!({
            "user_id": user_id,
            "username": username,
            "role": role.as_str(),
            "iat": now,
            "exp": now + expires_in,
        }),
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("sign token")
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn sale_body(date: &str, item_name: &str, quantity: i64, unit_price: f64) -> Value {
    json!({
        "date": date,
        "item_name": item_name,
        "quantity": quantity,
        "unit_price": unit_price,
    })
}
