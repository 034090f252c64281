//! Credit ledger boundary.
//!
//! Granting credits is the one side effect the webhook processor performs
//! outside its own tables, so it sits behind a trait: production uses the
//! SQLite adapter, tests substitute a recording double to assert on grant
//! counts without touching balances.

use chrono::Utc;
use rusqlite::params;

use crate::db::DbPool;
use crate::error::{AppError, Result};

pub trait CreditLedger: Send + Sync {
    /// Add credits to a user's balance. Additive only; Credgate never
    /// subtracts.
    fn add_credits(&self, user_id: &str, credits: i64) -> Result<()>;
}

/// Production ledger backed by the `credit_balances` table in the main DB.
pub struct SqliteCreditLedger {
    pool: DbPool,
}

impl SqliteCreditLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CreditLedger for SqliteCreditLedger {
    fn add_credits(&self, user_id: &str, credits: i64) -> Result<()> {
        if credits <= 0 {
            return Err(AppError::Internal(format!(
                "refusing non-positive credit grant of {} for {}",
                credits, user_id
            )));
        }

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO credit_balances (user_id, balance, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                balance = balance + excluded.balance,
                updated_at = excluded.updated_at",
            params![user_id, credits, Utc::now().timestamp()],
        )?;
        Ok(())
    }
}

/// Current balance for a user, defaulting to zero.
pub fn get_balance(conn: &rusqlite::Connection, user_id: &str) -> Result<i64> {
    use rusqlite::OptionalExtension;

    let balance = conn
        .query_row(
            "SELECT balance FROM credit_balances WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(balance.unwrap_or(0))
}
