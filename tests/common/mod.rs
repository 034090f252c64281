//! Test utilities and fixtures for Credgate integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};

pub use credgate::config::{RazorpayConfig, StripeConfig};
pub use credgate::db::{init_audit_db, init_db, queries, AppState, DbPool};
pub use credgate::error::Result;
pub use credgate::ledger::CreditLedger;
pub use credgate::models::*;

pub const TEST_STRIPE_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const TEST_RAZORPAY_WEBHOOK_SECRET: &str = "rzp_whsec_test";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an in-memory test audit database with schema initialized
pub fn setup_test_audit_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory audit database");
    init_audit_db(&conn).expect("Failed to initialize audit schema");
    conn
}

/// Ledger double that records grants instead of writing balances.
#[derive(Default)]
pub struct RecordingLedger {
    pub grants: Mutex<Vec<(String, i64)>>,
}

impl RecordingLedger {
    pub fn grant_count(&self) -> usize {
        self.grants.lock().unwrap().len()
    }

    pub fn total_for(&self, user_id: &str) -> i64 {
        self.grants
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, c)| c)
            .sum()
    }
}

impl CreditLedger for RecordingLedger {
    fn add_credits(&self, user_id: &str, credits: i64) -> Result<()> {
        self.grants
            .lock()
            .unwrap()
            .push((user_id.to_string(), credits));
        Ok(())
    }
}

/// In-memory pool for tests. max_size is pinned to 1 because each pooled
/// `memory()` connection would otherwise open its own separate database.
pub fn memory_pool<F: Fn(&Connection)>(init: F) -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("Failed to build test pool");
    {
        let conn = pool.get().expect("Failed to get test connection");
        init(&conn);
    }
    pool
}

/// Create an AppState for testing with in-memory databases and a recording
/// ledger. Both providers are configured with test secrets.
pub fn create_test_app_state() -> (AppState, Arc<RecordingLedger>) {
    let pool = memory_pool(|conn| init_db(conn).expect("Failed to initialize schema"));
    let audit_pool =
        memory_pool(|conn| init_audit_db(conn).expect("Failed to initialize audit schema"));

    let ledger = Arc::new(RecordingLedger::default());

    let state = AppState {
        db: pool,
        audit: audit_pool,
        base_url: "http://localhost:3000".to_string(),
        http_client: reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .expect("Failed to build test HTTP client"),
        stripe: Some(StripeConfig {
            secret_key: "sk_test_xxx".to_string(),
            webhook_secret: TEST_STRIPE_WEBHOOK_SECRET.to_string(),
        }),
        razorpay: Some(RazorpayConfig {
            key_id: "rzp_test_xxx".to_string(),
            key_secret: "rzp_secret_xxx".to_string(),
            webhook_secret: TEST_RAZORPAY_WEBHOOK_SECRET.to_string(),
        }),
        risk_block_threshold: 80,
        ledger: ledger.clone(),
    };

    (state, ledger)
}

/// Full application router over a test state.
pub fn test_app(state: AppState) -> Router {
    credgate::handlers::router().with_state(state)
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Create a test plan
pub fn create_test_plan(conn: &Connection, name: &str, amount_cents: i64, credits: i64) -> Plan {
    queries::create_plan(conn, name, amount_cents, "usd", credits)
        .expect("Failed to create test plan")
}

/// Create a pending payment tied to a provider order
pub fn create_test_payment(
    conn: &Connection,
    user_id: &str,
    provider: &str,
    provider_order_id: &str,
    plan_id: &str,
    amount_cents: i64,
    credits: i64,
) -> Payment {
    queries::create_payment(
        conn,
        &CreatePayment {
            user_id: user_id.to_string(),
            provider: provider.to_string(),
            provider_order_id: provider_order_id.to_string(),
            plan_id: plan_id.to_string(),
            amount_cents,
            currency: "usd".to_string(),
            credits,
        },
    )
    .expect("Failed to create test payment")
}

/// Insert an attempt row with an explicit status and timestamp, bypassing
/// the normal create/finalize flow so history can be backdated.
pub fn insert_attempt_at(
    conn: &Connection,
    user_id: &str,
    ip_address: Option<&str>,
    status: &str,
    created_at: i64,
) {
    conn.execute(
        "INSERT INTO payment_attempts
            (id, user_id, ip_address, amount_cents, currency, status, created_at)
         VALUES (?1, ?2, ?3, 1000, 'usd', ?4, ?5)",
        params![
            credgate::id::EntityType::PaymentAttempt.gen_id(),
            user_id,
            ip_address,
            status,
            created_at
        ],
    )
    .expect("Failed to insert attempt row");
}

/// Insert a paid payment row with an explicit amount, for seeding the mean
/// the amount-anomaly signal compares against.
pub fn insert_paid_payment(conn: &Connection, user_id: &str, plan_id: &str, amount_cents: i64) {
    let ts = now();
    conn.execute(
        "INSERT INTO payments
            (id, user_id, provider, provider_order_id, plan_id, amount_cents, currency, credits, status, created_at, updated_at)
         VALUES (?1, ?2, 'stripe', ?3, ?4, ?5, 'usd', 10, 'paid', ?6, ?6)",
        params![
            credgate::id::EntityType::Payment.gen_id(),
            user_id,
            format!("cs_hist_{}", uuid::Uuid::new_v4().as_simple()),
            plan_id,
            amount_cents,
            ts
        ],
    )
    .expect("Failed to insert paid payment row");
}

/// Count webhook log rows by status in the audit DB.
pub fn count_webhook_logs(conn: &Connection, status: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM webhook_logs WHERE status = ?1",
        params![status],
        |row| row.get(0),
    )
    .expect("Failed to count webhook logs")
}
