//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! This module provides a `FromRow` trait that models can implement to
//! define how they are constructed from database rows, plus helper functions
//! for common query patterns.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// This provides graceful error handling instead of panicking when database
/// contains invalid enum values (from corruption, migration errors, etc.).
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    /// Construct an instance from a database row.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const PLAN_COLS: &str = "id, name, amount_cents, currency, credits, created_at";

pub const ATTEMPT_COLS: &str = "id, user_id, ip_address, user_agent, payment_method, amount_cents, currency, status, risk_score, created_at";

pub const PAYMENT_COLS: &str = "id, user_id, provider, provider_order_id, provider_payment_id, plan_id, amount_cents, currency, credits, status, metadata, created_at, updated_at";

pub const WEBHOOK_LOG_COLS: &str =
    "id, provider, raw_headers, payload, signature, status, created_at";

// ============ FromRow Implementations ============

impl FromRow for Plan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Plan {
            id: row.get(0)?,
            name: row.get(1)?,
            amount_cents: row.get(2)?,
            currency: row.get(3)?,
            credits: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for PaymentAttempt {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PaymentAttempt {
            id: row.get(0)?,
            user_id: row.get(1)?,
            ip_address: row.get(2)?,
            user_agent: row.get(3)?,
            payment_method: row.get(4)?,
            amount_cents: row.get(5)?,
            currency: row.get(6)?,
            status: parse_enum(row, 7, "status")?,
            risk_score: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

impl FromRow for Payment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Payment {
            id: row.get(0)?,
            user_id: row.get(1)?,
            provider: row.get(2)?,
            provider_order_id: row.get(3)?,
            provider_payment_id: row.get(4)?,
            plan_id: row.get(5)?,
            amount_cents: row.get(6)?,
            currency: row.get(7)?,
            credits: row.get(8)?,
            status: parse_enum(row, 9, "status")?,
            metadata: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

impl FromRow for WebhookLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WebhookLog {
            id: row.get(0)?,
            provider: row.get(1)?,
            raw_headers: row.get(2)?,
            payload: row.get(3)?,
            signature: row.get(4)?,
            status: parse_enum(row, 5, "status")?,
            created_at: row.get(6)?,
        })
    }
}
