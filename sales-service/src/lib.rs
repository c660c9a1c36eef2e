pub mod app;
pub mod config;
pub mod db;
pub mod metrics;
pub mod repo;
pub mod report_handlers;
pub mod sales_handlers;
pub mod tokens;
pub mod user_handlers;

pub use app::{build_router, AppState};
