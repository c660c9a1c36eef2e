use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common_auth::JwtVerifier;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::warn;

use crate::metrics::SalesMetrics;
use crate::report_handlers::get_monthly_report;
use crate::sales_handlers::{create_sale, list_all_sales, list_my_sales};
use crate::tokens::TokenSigner;
use crate::user_handlers::{login_user, signup_user};

pub const SERVICE_NAME: &str = "PrepSheet Backend";

/// Handles shared by every request; built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub token_signer: Arc<TokenSigner>,
    pub metrics: Arc<SalesMetrics>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        jwt_verifier: JwtVerifier,
        token_signer: TokenSigner,
        metrics: SalesMetrics,
    ) -> Self {
        Self {
            db,
            jwt_verifier: Arc::new(jwt_verifier),
            token_signer: Arc::new(token_signer),
            metrics: Arc::new(metrics),
        }
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "Unable to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// All routes, without transport layers (CORS, tracing) so tests can drive it directly.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/signup", post(signup_user))
        .route("/login", post(login_user))
        .route("/sales", post(create_sale))
        .route("/sales/my", get(list_my_sales))
        .route("/sales/all", get(list_all_sales))
        .route("/reports/monthly", get(get_monthly_report));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
}
