use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct SalesMetrics {
    registry: Registry,
    login_attempts: IntCounterVec,
    sales_recorded: IntCounter,
    reports_generated: IntCounter,
}

impl SalesMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let login_attempts = IntCounterVec::new(
            Opts::new(
                "auth_login_attempts_total",
                "Count of login attempts grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(login_attempts.clone()))?;

        let sales_recorded =
            IntCounter::new("sales_recorded_total", "Count of sale entries persisted")?;
        registry.register(Box::new(sales_recorded.clone()))?;

        let reports_generated =
            IntCounter::new("monthly_reports_total", "Count of monthly reports generated")?;
        registry.register(Box::new(reports_generated.clone()))?;

        Ok(Self {
            registry,
            login_attempts,
            sales_recorded,
            reports_generated,
        })
    }

    pub fn login_attempt(&self, outcome: &str) {
        self.login_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn sale_recorded(&self) {
        self.sales_recorded.inc();
    }

    pub fn report_generated(&self) {
        self.reports_generated.inc();
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
