use chrono::Utc;
use rusqlite::{params, Connection, TransactionBehavior};

use crate::error::{AppError, Result};
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{query_all, query_one, ATTEMPT_COLS, PAYMENT_COLS, PLAN_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Plans ============

pub fn create_plan(
    conn: &Connection,
    name: &str,
    amount_cents: i64,
    currency: &str,
    credits: i64,
) -> Result<Plan> {
    let id = EntityType::Plan.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO plans (id, name, amount_cents, currency, credits, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, name, amount_cents, currency, credits, now],
    )?;

    Ok(Plan {
        id,
        name: name.to_string(),
        amount_cents,
        currency: currency.to_string(),
        credits,
        created_at: now,
    })
}

pub fn get_plan(conn: &Connection, id: &str) -> Result<Option<Plan>> {
    query_one(
        conn,
        &format!("SELECT {} FROM plans WHERE id = ?1", PLAN_COLS),
        &[&id],
    )
}

pub fn list_plans(conn: &Connection) -> Result<Vec<Plan>> {
    query_all(
        conn,
        &format!("SELECT {} FROM plans ORDER BY amount_cents", PLAN_COLS),
        &[],
    )
}

// ============ Payment Attempts ============

pub fn create_attempt(
    conn: &Connection,
    user_id: &str,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
    payment_method: Option<&str>,
    amount_cents: i64,
    currency: &str,
) -> Result<PaymentAttempt> {
    let id = EntityType::PaymentAttempt.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO payment_attempts
            (id, user_id, ip_address, user_agent, payment_method, amount_cents, currency, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'initiated', ?8)",
        params![
            &id,
            user_id,
            ip_address,
            user_agent,
            payment_method,
            amount_cents,
            currency,
            now
        ],
    )?;

    Ok(PaymentAttempt {
        id,
        user_id: user_id.to_string(),
        ip_address: ip_address.map(String::from),
        user_agent: user_agent.map(String::from),
        payment_method: payment_method.map(String::from),
        amount_cents,
        currency: currency.to_string(),
        status: AttemptStatus::Initiated,
        risk_score: None,
        created_at: now,
    })
}

/// Record the terminal state of an attempt along with the score that drove
/// the decision.
pub fn finalize_attempt(
    conn: &Connection,
    id: &str,
    status: AttemptStatus,
    risk_score: u8,
) -> Result<()> {
    conn.execute(
        "UPDATE payment_attempts SET status = ?1, risk_score = ?2 WHERE id = ?3",
        params![status.as_str(), risk_score as i64, id],
    )?;
    Ok(())
}

pub fn get_attempt(conn: &Connection, id: &str) -> Result<Option<PaymentAttempt>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payment_attempts WHERE id = ?1", ATTEMPT_COLS),
        &[&id],
    )
}

// ============ Payments ============

pub fn create_payment(conn: &Connection, input: &CreatePayment) -> Result<Payment> {
    let id = EntityType::Payment.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO payments
            (id, user_id, provider, provider_order_id, plan_id, amount_cents, currency, credits, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9, ?9)",
        params![
            &id,
            &input.user_id,
            &input.provider,
            &input.provider_order_id,
            &input.plan_id,
            input.amount_cents,
            &input.currency,
            input.credits,
            now
        ],
    )?;

    Ok(Payment {
        id,
        user_id: input.user_id.clone(),
        provider: input.provider.clone(),
        provider_order_id: input.provider_order_id.clone(),
        provider_payment_id: None,
        plan_id: input.plan_id.clone(),
        amount_cents: input.amount_cents,
        currency: input.currency.clone(),
        credits: input.credits,
        status: PaymentStatus::Pending,
        metadata: None,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_payment(conn: &Connection, id: &str) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLS),
        &[&id],
    )
}

pub fn get_payment_by_order(
    conn: &Connection,
    provider: &str,
    provider_order_id: &str,
) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE provider = ?1 AND provider_order_id = ?2",
            PAYMENT_COLS
        ),
        &[&provider, &provider_order_id],
    )
}

/// Outcome of applying a capture webhook to a payment.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// This delivery won the status CAS; credits are owed to the user.
    Applied(Payment),
    /// The payment was already paid. Metadata was appended, nothing else.
    AlreadyPaid(Payment),
}

/// Apply a payment-captured webhook atomically.
///
/// Runs inside a single immediate transaction: the compare-and-swap
/// `status <> 'paid'` update and the metadata append commit together or not
/// at all. Concurrent duplicate deliveries serialize on the write lock and
/// exactly one observes an affected row.
///
/// Returns `AppError::Reconciliation` when no payment matches the order,
/// which surfaces as a 500 so the provider retries the delivery.
pub fn apply_payment_captured(
    conn: &mut Connection,
    provider: &str,
    provider_order_id: &str,
    provider_payment_id: &str,
    event: &str,
    payload: &serde_json::Value,
) -> Result<CaptureOutcome> {
    let now = now();
    let annotation = webhook_annotation(event, payload, now);

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let Some(payment) = get_payment_by_order(&tx, provider, provider_order_id)? else {
        return Err(AppError::Reconciliation(format!(
            "no payment for {} order {}",
            provider, provider_order_id
        )));
    };

    let claimed = tx.execute(
        "UPDATE payments
         SET status = 'paid', provider_payment_id = ?1, updated_at = ?2
         WHERE provider = ?3 AND provider_order_id = ?4 AND status <> 'paid'",
        params![provider_payment_id, now, provider, provider_order_id],
    )? > 0;

    append_payment_metadata(&tx, &payment.id, &annotation, now)?;

    // Re-read inside the transaction so the caller sees the final row.
    let Some(updated) = get_payment(&tx, &payment.id)? else {
        return Err(AppError::Internal(format!(
            "payment {} vanished mid-transaction",
            payment.id
        )));
    };

    tx.commit()?;

    if claimed {
        Ok(CaptureOutcome::Applied(updated))
    } else {
        Ok(CaptureOutcome::AlreadyPaid(updated))
    }
}

/// Apply a payment-failed webhook. Never downgrades a paid payment; a late
/// failure event for a captured order only appends metadata.
///
/// Returns the payment when one matched the order, None otherwise.
pub fn apply_payment_failed(
    conn: &mut Connection,
    provider: &str,
    provider_order_id: &str,
    event: &str,
    payload: &serde_json::Value,
) -> Result<Option<Payment>> {
    let now = now();
    let annotation = webhook_annotation(event, payload, now);

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let Some(payment) = get_payment_by_order(&tx, provider, provider_order_id)? else {
        return Ok(None);
    };

    tx.execute(
        "UPDATE payments SET status = 'failed', updated_at = ?1
         WHERE provider = ?2 AND provider_order_id = ?3 AND status <> 'paid'",
        params![now, provider, provider_order_id],
    )?;

    append_payment_metadata(&tx, &payment.id, &annotation, now)?;

    let updated = get_payment(&tx, &payment.id)?;
    tx.commit()?;

    Ok(updated)
}

fn webhook_annotation(event: &str, payload: &serde_json::Value, now: i64) -> serde_json::Value {
    serde_json::json!({
        "event": event,
        "payload": payload,
        "received_at": now,
    })
}

/// Append one annotation to the payment's metadata JSON array. Existing
/// entries are preserved; a corrupt or non-array value is replaced with a
/// fresh array rather than failing the webhook.
fn append_payment_metadata(
    conn: &Connection,
    payment_id: &str,
    annotation: &serde_json::Value,
    now: i64,
) -> Result<()> {
    let current: Option<String> = conn.query_row(
        "SELECT metadata FROM payments WHERE id = ?1",
        params![payment_id],
        |row| row.get(0),
    )?;

    let mut entries = current
        .as_deref()
        .and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default();
    entries.push(annotation.clone());

    conn.execute(
        "UPDATE payments SET metadata = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            serde_json::Value::Array(entries).to_string(),
            now,
            payment_id
        ],
    )?;
    Ok(())
}

// ============ Webhook Logs (audit DB) ============

pub fn create_webhook_log(
    conn: &Connection,
    provider: &str,
    raw_headers: &str,
    payload: &str,
    signature: Option<&str>,
    status: WebhookLogStatus,
) -> Result<WebhookLog> {
    let id = EntityType::WebhookLog.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO webhook_logs (id, provider, raw_headers, payload, signature, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![&id, provider, raw_headers, payload, signature, status.as_str(), now],
    )?;

    Ok(WebhookLog {
        id,
        provider: provider.to_string(),
        raw_headers: raw_headers.to_string(),
        payload: payload.to_string(),
        signature: signature.map(String::from),
        status,
        created_at: now,
    })
}

/// Purge old webhook logs beyond the retention period.
/// Returns the number of deleted records.
/// Called on startup when WEBHOOK_LOG_RETENTION_DAYS > 0.
pub fn purge_old_webhook_logs(conn: &Connection, retention_days: i64) -> Result<usize> {
    let cutoff = now() - (retention_days * 86400);
    let deleted = conn.execute(
        "DELETE FROM webhook_logs WHERE created_at < ?1",
        params![cutoff],
    )?;
    Ok(deleted)
}
