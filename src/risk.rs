//! Fraud-risk scoring for checkout attempts.
//!
//! The scorer is read-only over attempt and payment history and returns a
//! 0-100 score. Policy (which score blocks a checkout) lives in the checkout
//! handler, not here, so the threshold can move without touching the signals.

use rusqlite::{params, Connection};

use crate::error::Result;

/// Points added when the user has more than [`VELOCITY_MAX_FAILED`] failed
/// attempts inside the trailing hour.
pub const VELOCITY_POINTS: u8 = 30;
pub const VELOCITY_WINDOW_SECS: i64 = 3600;
pub const VELOCITY_MAX_FAILED: i64 = 3;

/// Points added when the requested amount exceeds three times the user's
/// mean paid amount. Skipped entirely for users with no paid history.
pub const AMOUNT_ANOMALY_POINTS: u8 = 20;
pub const AMOUNT_ANOMALY_FACTOR: f64 = 3.0;

/// Points added when attempts arrive from more than
/// [`IP_FAN_OUT_MAX_DISTINCT`] distinct IPs inside the trailing day.
pub const IP_FAN_OUT_POINTS: u8 = 25;
pub const IP_FAN_OUT_WINDOW_SECS: i64 = 86400;
pub const IP_FAN_OUT_MAX_DISTINCT: i64 = 5;

/// Per-signal breakdown of a risk assessment. The breakdown is logged for
/// operators; only the total ever leaves the process.
#[derive(Debug, Clone, Copy)]
pub struct RiskBreakdown {
    pub velocity: u8,
    pub amount_anomaly: u8,
    pub ip_fan_out: u8,
    pub score: u8,
}

/// Score a checkout attempt against the user's history.
pub fn score(
    conn: &Connection,
    user_id: &str,
    ip_address: Option<&str>,
    amount_cents: i64,
) -> Result<RiskBreakdown> {
    score_at(
        conn,
        chrono::Utc::now().timestamp(),
        user_id,
        ip_address,
        amount_cents,
    )
}

/// Score against an explicit clock so the trailing windows are testable.
pub fn score_at(
    conn: &Connection,
    now: i64,
    user_id: &str,
    ip_address: Option<&str>,
    amount_cents: i64,
) -> Result<RiskBreakdown> {
    let velocity = if failed_attempts_since(conn, user_id, now - VELOCITY_WINDOW_SECS)?
        > VELOCITY_MAX_FAILED
    {
        VELOCITY_POINTS
    } else {
        0
    };

    let amount_anomaly = match mean_paid_amount(conn, user_id)? {
        Some(mean) if (amount_cents as f64) > AMOUNT_ANOMALY_FACTOR * mean => {
            AMOUNT_ANOMALY_POINTS
        }
        _ => 0,
    };

    let ip_fan_out = if distinct_attempt_ips_since(
        conn,
        user_id,
        ip_address,
        now - IP_FAN_OUT_WINDOW_SECS,
    )? > IP_FAN_OUT_MAX_DISTINCT
    {
        IP_FAN_OUT_POINTS
    } else {
        0
    };

    let total =
        velocity as u16 + amount_anomaly as u16 + ip_fan_out as u16;
    let score = total.min(100) as u8;

    Ok(RiskBreakdown {
        velocity,
        amount_anomaly,
        ip_fan_out,
        score,
    })
}

fn failed_attempts_since(conn: &Connection, user_id: &str, cutoff: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM payment_attempts
         WHERE user_id = ?1 AND status = 'failed' AND created_at >= ?2",
        params![user_id, cutoff],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Mean amount across the user's paid payments. None when the user has no
/// paid history, which disables the anomaly signal for first purchases.
fn mean_paid_amount(conn: &Connection, user_id: &str) -> Result<Option<f64>> {
    let mean = conn.query_row(
        "SELECT AVG(amount_cents) FROM payments WHERE user_id = ?1 AND status = 'paid'",
        params![user_id],
        |row| row.get::<_, Option<f64>>(0),
    )?;
    Ok(mean)
}

/// Distinct attempt IPs in the window, counting the current request's IP
/// even when its attempt row has not been written yet.
fn distinct_attempt_ips_since(
    conn: &Connection,
    user_id: &str,
    current_ip: Option<&str>,
    cutoff: i64,
) -> Result<i64> {
    let mut distinct: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT ip_address) FROM payment_attempts
         WHERE user_id = ?1 AND created_at >= ?2 AND ip_address IS NOT NULL",
        params![user_id, cutoff],
        |row| row.get(0),
    )?;

    if let Some(ip) = current_ip {
        let seen: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM payment_attempts
                WHERE user_id = ?1 AND created_at >= ?2 AND ip_address = ?3
             )",
            params![user_id, cutoff, ip],
            |row| row.get(0),
        )?;
        if !seen {
            distinct += 1;
        }
    }

    Ok(distinct)
}
