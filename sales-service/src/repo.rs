use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// A persisted sale. `total_price` is written once at insert and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Sale {
    pub id: i64,
    pub employee_id: i64,
    pub date: String,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SaleInsert<'a> {
    pub employee_id: i64,
    pub date: NaiveDate,
    pub item_name: &'a str,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub notes: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct MonthTotals {
    pub total_sales: f64,
    pub total_items: i64,
    pub entry_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

const SALE_COLUMNS: &str =
    "id, employee_id, date, item_name, quantity, unit_price, total_price, notes, created_at";

pub async fn insert_sale(db: &SqlitePool, sale: &SaleInsert<'_>) -> Result<Sale, sqlx::Error> {
    let sql = format!(
        "INSERT INTO sales (employee_id, date, item_name, quantity, unit_price, total_price, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         RETURNING {SALE_COLUMNS}"
    );
    sqlx::query_as::<_, Sale>(&sql)
        .bind(sale.employee_id)
        .bind(sale.date.format("%Y-%m-%d").to_string())
        .bind(sale.item_name)
        .bind(sale.quantity)
        .bind(sale.unit_price)
        .bind(sale.total_price)
        .bind(sale.notes)
        .bind(Utc::now())
        .fetch_one(db)
        .await
}

pub async fn sales_for_employee(db: &SqlitePool, employee_id: i64) -> Result<Vec<Sale>, sqlx::Error> {
    let sql = format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE employee_id = ?1 ORDER BY date DESC, id DESC"
    );
    sqlx::query_as::<_, Sale>(&sql)
        .bind(employee_id)
        .fetch_all(db)
        .await
}

pub async fn all_sales(db: &SqlitePool) -> Result<Vec<Sale>, sqlx::Error> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY date DESC, id DESC");
    sqlx::query_as::<_, Sale>(&sql).fetch_all(db).await
}

/// Inclusive on both ends.
pub async fn sales_between(
    db: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Sale>, sqlx::Error> {
    let sql = format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE date BETWEEN ?1 AND ?2 ORDER BY date DESC, id DESC"
    );
    sqlx::query_as::<_, Sale>(&sql)
        .bind(start.format("%Y-%m-%d").to_string())
        .bind(end.format("%Y-%m-%d").to_string())
        .fetch_all(db)
        .await
}

/// Totals over `[first_day, next_month_first_day)`.
pub async fn month_totals(
    db: &SqlitePool,
    first_day: NaiveDate,
    next_month_first_day: NaiveDate,
) -> Result<MonthTotals, sqlx::Error> {
    sqlx::query_as::<_, MonthTotals>(
        "SELECT COALESCE(SUM(total_price), 0.0) AS total_sales,
                COALESCE(SUM(quantity), 0) AS total_items,
                COUNT(*) AS entry_count
         FROM sales
         WHERE date >= ?1 AND date < ?2",
    )
    .bind(first_day.format("%Y-%m-%d").to_string())
    .bind(next_month_first_day.format("%Y-%m-%d").to_string())
    .fetch_one(db)
    .await
}

pub async fn insert_user(
    db: &SqlitePool,
    username: &str,
    password_hash: &str,
    role: &str,
) -> Result<UserRow, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id, username, password_hash, role, created_at",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .bind(Utc::now())
    .fetch_one(db)
    .await
}

pub async fn find_user_by_username(
    db: &SqlitePool,
    username: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(db)
    .await
}
