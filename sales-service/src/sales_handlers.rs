use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use common_auth::{ensure_allowed, AuthenticatedIdentity, Operation};
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::repo::{self, Sale, SaleInsert};
use crate::AppState;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const REQUIRED_FIELDS_MESSAGE: &str =
    "Date, item_name, quantity (>0), and unit_price (>0) are required";

/// Sale payload as submitted by an employee. Missing fields decode to empty/zero
/// so they are reported by validation rather than as a decoding failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewSale {
    pub date: String,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub notes: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct ValidatedSale {
    pub date: NaiveDate,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaleCreated {
    pub message: &'static str,
    pub sale_id: i64,
    pub total_price: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Date filter for the manager listing. Only applied when both bounds are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    All,
    Between { start: NaiveDate, end: NaiveDate },
}

pub fn total_price(quantity: i64, unit_price: f64) -> f64 {
    quantity as f64 * unit_price
}

pub fn validate_sale(input: NewSale) -> ApiResult<ValidatedSale> {
    let NewSale {
        date,
        item_name,
        quantity,
        unit_price,
        notes,
    } = input;

    let date = date.trim();
    let item_name = item_name.trim();
    let total = total_price(quantity, unit_price);
    // A finite total also rules out a non-finite unit price.
    if date.is_empty()
        || item_name.is_empty()
        || quantity <= 0
        || unit_price <= 0.0
        || !total.is_finite()
    {
        return Err(ApiError::bad_request("invalid_sale", REQUIRED_FIELDS_MESSAGE));
    }

    let date = parse_date(date).ok_or_else(|| {
        ApiError::bad_request("invalid_date", "date must be formatted as YYYY-MM-DD")
    })?;

    let notes = notes.filter(|value| !value.trim().is_empty());

    Ok(ValidatedSale {
        date,
        item_name: item_name.to_string(),
        quantity,
        unit_price,
        total_price: total,
        notes,
    })
}

pub fn resolve_date_filter(query: SalesRangeQuery) -> ApiResult<DateFilter> {
    let start = query.start_date.filter(|value| !value.trim().is_empty());
    let end = query.end_date.filter(|value| !value.trim().is_empty());

    match (start, end) {
        (Some(start), Some(end)) => {
            let parsed = parse_date(start.trim()).zip(parse_date(end.trim()));
            let (start, end) = parsed.ok_or_else(|| {
                ApiError::bad_request(
                    "invalid_date_range",
                    "start_date and end_date must be formatted as YYYY-MM-DD",
                )
            })?;
            Ok(DateFilter::Between { start, end })
        }
        // A lone bound is ignored rather than half-applied.
        _ => Ok(DateFilter::All),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub async fn create_sale(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    payload: Result<Json<NewSale>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleCreated>)> {
    ensure_allowed(&identity, Operation::RecordSale)?;

    let Json(input) =
        payload.map_err(|_| ApiError::bad_request("invalid_body", "Invalid request body"))?;
    let sale = validate_sale(input)?;

    let stored = repo::insert_sale(
        &state.db,
        &SaleInsert {
            employee_id: identity.user_id,
            date: sale.date,
            item_name: &sale.item_name,
            quantity: sale.quantity,
            unit_price: sale.unit_price,
            total_price: sale.total_price,
            notes: sale.notes.as_deref(),
        },
    )
    .await
    .map_err(|err| {
        error!(user_id = identity.user_id, error = %err, "Failed to insert sale");
        ApiError::internal("Failed to add sale entry")
    })?;

    state.metrics.sale_recorded();
    info!(
        sale_id = stored.id,
        user_id = identity.user_id,
        total_price = stored.total_price,
        "sale recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(SaleCreated {
            message: "Sale entry added successfully",
            sale_id: stored.id,
            total_price: stored.total_price,
        }),
    ))
}

pub async fn list_my_sales(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
) -> ApiResult<Json<Vec<Sale>>> {
    ensure_allowed(&identity, Operation::ListOwnSales)?;

    let sales = repo::sales_for_employee(&state.db, identity.user_id)
        .await
        .map_err(|err| {
            error!(user_id = identity.user_id, error = %err, "Failed to fetch own sales");
            ApiError::internal("Failed to fetch sales")
        })?;

    Ok(Json(sales))
}

pub async fn list_all_sales(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    query: Result<Query<SalesRangeQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    ensure_allowed(&identity, Operation::ListAllSales)?;

    let Query(query) = query.map_err(|_| {
        ApiError::bad_request("invalid_query", "Invalid query parameters")
    })?;
    let filter = resolve_date_filter(query)?;

    let result = match filter {
        DateFilter::All => repo::all_sales(&state.db).await,
        DateFilter::Between { start, end } => repo::sales_between(&state.db, start, end).await,
    };
    let sales = result.map_err(|err| {
        error!(?filter, error = %err, "Failed to fetch sales");
        ApiError::internal("Failed to fetch sales")
    })?;

    Ok(Json(sales))
}
