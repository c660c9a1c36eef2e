use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use common_auth::{ensure_allowed, AuthenticatedIdentity, Operation};
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::repo;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyReportQuery {
    pub month: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month: String,
    pub total_sales: f64,
    pub total_items: i64,
    pub entry_count: i64,
}

/// A calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportMonth {
    first_day: NaiveDate,
}

impl ReportMonth {
    pub fn containing(day: NaiveDate) -> Self {
        Self {
            first_day: day.with_day(1).unwrap_or(day),
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let bytes = label.as_bytes();
        if bytes.len() != 7
            || bytes[4] != b'-'
            || !bytes
                .iter()
                .enumerate()
                .all(|(idx, byte)| idx == 4 || byte.is_ascii_digit())
        {
            return None;
        }
        let year = label[..4].parse::<i32>().ok()?;
        let month = label[5..].parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn next_first_day(&self) -> Option<NaiveDate> {
        self.first_day.checked_add_months(Months::new(1))
    }

    pub fn label(&self) -> String {
        self.first_day.format("%Y-%m").to_string()
    }
}

/// Picks the requested month, or the month containing `today` when none is given.
pub fn resolve_month(requested: Option<&str>, today: NaiveDate) -> ApiResult<ReportMonth> {
    match requested.map(str::trim).filter(|value| !value.is_empty()) {
        Some(label) => ReportMonth::parse(label).ok_or_else(|| {
            ApiError::bad_request("invalid_month", "month must be formatted as YYYY-MM")
        }),
        None => Ok(ReportMonth::containing(today)),
    }
}

/// Aggregates every sale dated within `month`. An empty month is a zero-valued report.
pub async fn monthly_report(db: &SqlitePool, month: ReportMonth) -> Result<MonthlyReport, sqlx::Error> {
    let label = month.label();
    let Some(next) = month.next_first_day() else {
        // No representable following month; nothing can be dated inside it either.
        return Ok(MonthlyReport {
            month: label,
            total_sales: 0.0,
            total_items: 0,
            entry_count: 0,
        });
    };

    let totals = repo::month_totals(db, month.first_day(), next).await?;
    debug!(month = %label, entries = totals.entry_count, "monthly totals computed");

    Ok(MonthlyReport {
        month: label,
        total_sales: totals.total_sales,
        total_items: totals.total_items,
        entry_count: totals.entry_count,
    })
}

pub async fn get_monthly_report(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    query: Result<Query<MonthlyReportQuery>, QueryRejection>,
) -> ApiResult<Json<MonthlyReport>> {
    ensure_allowed(&identity, Operation::MonthlyReport)?;

    let Query(query) = query.map_err(|_| {
        ApiError::bad_request("invalid_query", "Invalid query parameters")
    })?;
    let month = resolve_month(query.month.as_deref(), Utc::now().date_naive())?;

    let report = monthly_report(&state.db, month).await.map_err(|err| {
        error!(month = %month.label(), error = %err, "Failed to generate report");
        ApiError::internal("Failed to generate report")
    })?;

    state.metrics.report_generated();
    Ok(Json(report))
}
