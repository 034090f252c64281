//! Checkout surface: payment creation and lookup.
//!
//! The sequencing contract matters more than the happy path here: the
//! attempt row is written before any external call, the risk decision is
//! recorded whether or not the provider is ever reached, and a provider
//! failure still leaves a failed attempt behind for the velocity signal.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{AuthedUser, Json, Path};
use crate::models::{AttemptStatus, CreatePayment, Payment};
use crate::payments::{self, IntentRequest, PaymentProvider};
use crate::risk;
use crate::util::extract_request_info;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub provider: String,
    pub plan_id: String,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    pub provider_order_id: String,
    pub checkout_url: Option<String>,
}

/// POST /payments/create
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthedUser,
    headers: HeaderMap,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Response> {
    let provider: PaymentProvider = req.provider.parse()?;

    let conn = state.db.get()?;

    let plan = queries::get_plan(&conn, &req.plan_id)?
        .ok_or_else(|| AppError::NotFound(format!("Plan {}", req.plan_id)))?;

    let (ip, user_agent) = extract_request_info(&headers);

    // Attempt row first, so a crash or provider outage from here on still
    // leaves a record.
    let attempt = queries::create_attempt(
        &conn,
        &user.user_id,
        ip.as_deref(),
        user_agent.as_deref(),
        req.payment_method.as_deref(),
        plan.amount_cents,
        &plan.currency,
    )?;

    let breakdown = risk::score(&conn, &user.user_id, ip.as_deref(), plan.amount_cents)?;

    if breakdown.score > state.risk_block_threshold {
        queries::finalize_attempt(&conn, &attempt.id, AttemptStatus::Blocked, breakdown.score)?;
        tracing::warn!(
            "Blocked payment attempt {} for user {}: score={} (velocity={}, amount={}, ip={})",
            attempt.id,
            user.user_id,
            breakdown.score,
            breakdown.velocity,
            breakdown.amount_anomaly,
            breakdown.ip_fan_out
        );
        // Deliberately generic: the score and signals never reach the client.
        return Ok((
            StatusCode::FORBIDDEN,
            axum::Json(serde_json::json!({
                "error": "Payment cannot be processed at this time"
            })),
        )
            .into_response());
    }

    // Release the pool slot before the outbound call.
    drop(conn);

    let intent_request = IntentRequest {
        plan_id: plan.id.clone(),
        plan_name: plan.name.clone(),
        amount_cents: plan.amount_cents,
        currency: plan.currency.clone(),
        user_id: user.user_id.clone(),
        success_url: format!("{}/payments/success", state.base_url),
        cancel_url: format!("{}/payments/cancel", state.base_url),
    };

    let intent = match payments::create_intent(&state, provider, &intent_request).await {
        Ok(intent) => intent,
        Err(e) => {
            let conn = state.db.get()?;
            queries::finalize_attempt(&conn, &attempt.id, AttemptStatus::Failed, breakdown.score)?;
            return Err(e);
        }
    };

    let conn = state.db.get()?;

    let payment = queries::create_payment(
        &conn,
        &CreatePayment {
            user_id: user.user_id.clone(),
            provider: provider.as_str().to_string(),
            provider_order_id: intent.provider_order_id.clone(),
            plan_id: plan.id.clone(),
            amount_cents: plan.amount_cents,
            currency: plan.currency.clone(),
            credits: plan.credits,
        },
    )?;

    queries::finalize_attempt(&conn, &attempt.id, AttemptStatus::Success, breakdown.score)?;

    tracing::info!(
        "Created {} payment {} for user {}: order={}, amount={} {}",
        provider,
        payment.id,
        user.user_id,
        intent.provider_order_id,
        plan.amount_cents,
        plan.currency
    );

    Ok(Json(CreatePaymentResponse {
        payment_id: payment.id,
        provider_order_id: intent.provider_order_id,
        checkout_url: intent.checkout_url,
    })
    .into_response())
}

/// GET /payments/{id} - reconciliation and debug surface for the owning user.
pub async fn get_payment(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Payment>> {
    let conn = state.db.get()?;

    let payment = queries::get_payment(&conn, &id)?
        .filter(|p| p.user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Payment {}", id)))?;

    Ok(Json(payment))
}
