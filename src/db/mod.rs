mod from_row;
mod schema;
pub mod queries;

pub use from_row::{query_all, query_one, FromRow};
pub use schema::{init_audit_db, init_db};

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::{RazorpayConfig, StripeConfig};
use crate::ledger::CreditLedger;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding database pools and configuration
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (plans, attempts, payments, balances)
    pub db: DbPool,
    /// Webhook audit database pool (separate file to isolate growth)
    pub audit: DbPool,
    /// Base URL for checkout redirect callbacks
    pub base_url: String,
    /// Shared outbound HTTP client for provider calls
    pub http_client: reqwest::Client,
    pub stripe: Option<StripeConfig>,
    pub razorpay: Option<RazorpayConfig>,
    /// Attempts scoring above this are blocked before any provider call
    pub risk_block_threshold: u8,
    /// Credit grant boundary; swapped for a recording double in tests
    pub ledger: Arc<dyn CreditLedger>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
