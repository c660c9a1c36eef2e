use anyhow::{Context, Result};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use common_auth::{JwtConfig, JwtVerifier};
use sales_service::config::{load_service_config, ServiceConfig};
use sales_service::metrics::SalesMetrics;
use sales_service::tokens::{TokenConfig, TokenSigner};
use sales_service::{build_router, db, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cors_layer(config: &ServiceConfig) -> Result<CorsLayer> {
    let origin = if config.cors_allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins = config
            .cors_allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid CORS origin '{origin}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_service_config()?;
    info!(?config, "loaded configuration");

    let db_pool = db::connect(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to open database")?;
    db::run_migrations(&db_pool)
        .await
        .context("Failed to apply schema")?;

    let jwt_verifier = JwtVerifier::new(
        JwtConfig::new(config.jwt_secret.clone()).with_leeway(config.jwt_leeway_seconds),
    )?;
    let token_signer = TokenSigner::new(TokenConfig {
        secret: config.jwt_secret.clone(),
        ttl_seconds: config.token_ttl_seconds,
    })?;
    let metrics = SalesMetrics::new()?;

    let state = AppState::new(db_pool, jwt_verifier, token_signer, metrics);
    let app = build_router(state)
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from((config.host, config.port));
    info!(%addr, "starting sales-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
