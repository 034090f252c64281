//! Common webhook handling infrastructure for payment providers.
//!
//! This module provides a trait-based approach to unify Stripe and Razorpay
//! webhook handlers: providers reduce their header schemes and payload shapes
//! to a shared (signature, timestamp) pair and a tagged event, and the state
//! machine here does everything else.

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::WebhookLogStatus;
use crate::signature;
use crate::util::headers_to_json;

/// Signature material extracted from provider-specific headers.
///
/// `header_value` is what gets recorded in the webhook log; for Stripe that
/// is the combined `t=...,v1=...` header, for Razorpay the bare signature.
#[derive(Debug, Default)]
pub struct SignatureParts {
    pub signature: Option<String>,
    pub timestamp: Option<String>,
    pub header_value: Option<String>,
}

/// Data extracted from a payment-captured event.
#[derive(Debug)]
pub struct CaptureData {
    /// Provider-side order/session ID; matches payments.provider_order_id.
    pub provider_order_id: String,
    /// Provider-side payment/charge ID.
    pub provider_payment_id: String,
    /// Provider's event type string, recorded in payment metadata.
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Data extracted from a payment-failed event.
#[derive(Debug)]
pub struct FailureData {
    pub provider_order_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Parsed webhook event with provider-agnostic data.
///
/// Tagged variants rather than a stringly event: the processor can only
/// mutate payments through one of these, and new event types land in
/// `Unknown` until someone deliberately adds a variant.
#[derive(Debug)]
pub enum WebhookEvent {
    /// Payment captured by the provider - grants credits
    PaymentCaptured(CaptureData),
    /// Payment failed or expired - terminal unless already paid
    PaymentFailed(FailureData),
    /// Event type not relevant to payment reconciliation
    Unknown(String),
}

/// Trait for payment provider webhook handling.
///
/// Implementors provide provider-specific header and payload parsing, while
/// the common state machine handles verification, audit logging, the
/// idempotent status transition, and the credit grant.
pub trait WebhookProvider: Send + Sync {
    /// Provider name for logging and database storage (e.g., "stripe")
    fn provider_name(&self) -> &'static str;

    /// Secret used to verify this provider's webhook signatures.
    fn webhook_secret(&self) -> &str;

    /// Extract the signature and timestamp from request headers. Missing
    /// headers are not an error here; verification fails closed on them.
    fn extract_signature(&self, headers: &HeaderMap) -> SignatureParts;

    /// Parse the webhook payload into a provider-agnostic event.
    /// Schema violations return `AppError::Validation`.
    fn parse_event(&self, body: &Bytes) -> Result<WebhookEvent>;
}

/// 200 response body all providers accept as an acknowledgement.
fn ack() -> Response {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "received": true })),
    )
        .into_response()
}

fn write_webhook_log(
    state: &AppState,
    provider: &str,
    headers: &HeaderMap,
    body: &Bytes,
    signature: Option<&str>,
    status: WebhookLogStatus,
) -> Result<()> {
    let conn = state.audit.get()?;
    queries::create_webhook_log(
        &conn,
        provider,
        &headers_to_json(headers),
        &String::from_utf8_lossy(body),
        signature,
        status,
    )?;
    Ok(())
}

/// Generic webhook handler that delegates to provider-specific implementations.
///
/// State machine per delivery:
/// 1. verify signature; failure is logged to the audit DB and returns 401
/// 2. log the verified delivery, before any parsing or payment mutation
/// 3. parse; schema violations return 400 with no further side effects
/// 4. apply the event to the matching payment, exactly once per order
pub async fn handle_webhook<P: WebhookProvider>(
    provider: &P,
    state: &AppState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let parts = provider.extract_signature(&headers);

    let verified = signature::verify(
        &body,
        parts.signature.as_deref(),
        parts.timestamp.as_deref(),
        provider.webhook_secret(),
    );

    if !verified {
        tracing::warn!("{} webhook rejected: invalid signature", provider.provider_name());
        write_webhook_log(
            state,
            provider.provider_name(),
            &headers,
            &body,
            parts.header_value.as_deref(),
            WebhookLogStatus::SignatureFailed,
        )?;
        return Err(AppError::SignatureRejected);
    }

    // Authentic delivery: make it durable before touching payments, so a
    // crash mid-processing still leaves an audit trail.
    write_webhook_log(
        state,
        provider.provider_name(),
        &headers,
        &body,
        parts.header_value.as_deref(),
        WebhookLogStatus::Verified,
    )?;

    let event = provider.parse_event(&body)?;

    match event {
        WebhookEvent::PaymentCaptured(data) => {
            handle_captured(provider, state, data)
        }
        WebhookEvent::PaymentFailed(data) => handle_failed(provider, state, data),
        WebhookEvent::Unknown(event_type) => {
            tracing::info!(
                "{} webhook ignored: event type {}",
                provider.provider_name(),
                event_type
            );
            Ok(ack())
        }
    }
}

fn handle_captured<P: WebhookProvider>(
    provider: &P,
    state: &AppState,
    data: CaptureData,
) -> Result<Response> {
    let mut conn = state.db.get()?;

    let outcome = queries::apply_payment_captured(
        &mut conn,
        provider.provider_name(),
        &data.provider_order_id,
        &data.provider_payment_id,
        &data.event_type,
        &data.payload,
    )?;

    match outcome {
        queries::CaptureOutcome::Applied(payment) => {
            // The status flip is committed; the grant happens exactly once
            // because only the CAS winner reaches this branch. A ledger
            // failure surfaces as 500 with the audit trail already durable.
            if payment.credits > 0 {
                state.ledger.add_credits(&payment.user_id, payment.credits)?;
            }
            tracing::info!(
                "{} payment captured: order={}, payment={}, credits={}",
                provider.provider_name(),
                data.provider_order_id,
                payment.id,
                payment.credits
            );
            Ok(ack())
        }
        queries::CaptureOutcome::AlreadyPaid(payment) => {
            tracing::info!(
                "{} duplicate capture for order={}, payment={} already paid",
                provider.provider_name(),
                data.provider_order_id,
                payment.id
            );
            Ok(ack())
        }
    }
}

fn handle_failed<P: WebhookProvider>(
    provider: &P,
    state: &AppState,
    data: FailureData,
) -> Result<Response> {
    let mut conn = state.db.get()?;

    let payment = queries::apply_payment_failed(
        &mut conn,
        provider.provider_name(),
        &data.provider_order_id,
        &data.event_type,
        &data.payload,
    )?;

    let Some(payment) = payment else {
        return Err(AppError::Reconciliation(format!(
            "no payment for {} order {}",
            provider.provider_name(),
            data.provider_order_id
        )));
    };

    tracing::info!(
        "{} payment failed: order={}, payment={}, status={}",
        provider.provider_name(),
        data.provider_order_id,
        payment.id,
        payment.status
    );
    Ok(ack())
}
