use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
};

use crate::db::AppState;
use crate::error::{AppError, Result};

use super::common::{
    handle_webhook, CaptureData, FailureData, SignatureParts, WebhookEvent, WebhookProvider,
};

/// Stripe webhook provider implementation.
pub struct StripeWebhookProvider {
    webhook_secret: String,
}

impl WebhookProvider for StripeWebhookProvider {
    fn provider_name(&self) -> &'static str {
        "stripe"
    }

    fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Stripe packs both values into one header: `t=timestamp,v1=signature`.
    fn extract_signature(&self, headers: &HeaderMap) -> SignatureParts {
        let Some(header) = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
        else {
            return SignatureParts::default();
        };

        let mut timestamp = None;
        let mut sig_v1 = None;
        for part in header.split(',') {
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = Some(t.to_string());
            } else if let Some(s) = part.strip_prefix("v1=") {
                sig_v1 = Some(s.to_string());
            }
        }

        SignatureParts {
            signature: sig_v1,
            timestamp,
            header_value: Some(header.to_string()),
        }
    }

    fn parse_event(&self, body: &Bytes) -> Result<WebhookEvent> {
        let payload: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Malformed Stripe payload: {}", e)))?;

        let event_type = payload["type"]
            .as_str()
            .ok_or_else(|| AppError::Validation("Stripe event missing type".to_string()))?
            .to_string();

        match event_type.as_str() {
            "checkout.session.completed" => {
                let object = &payload["data"]["object"];
                let session_id = object["id"].as_str().ok_or_else(|| {
                    AppError::Validation("Stripe checkout event missing session id".to_string())
                })?;
                // payment_intent can be null for zero-amount sessions; fall
                // back to the session id so the capture still reconciles.
                let payment_intent = object["payment_intent"].as_str().unwrap_or(session_id);

                Ok(WebhookEvent::PaymentCaptured(CaptureData {
                    provider_order_id: session_id.to_string(),
                    provider_payment_id: payment_intent.to_string(),
                    event_type,
                    payload,
                }))
            }
            "checkout.session.async_payment_failed" | "checkout.session.expired" => {
                let session_id = payload["data"]["object"]["id"].as_str().ok_or_else(|| {
                    AppError::Validation("Stripe checkout event missing session id".to_string())
                })?;

                Ok(WebhookEvent::PaymentFailed(FailureData {
                    provider_order_id: session_id.to_string(),
                    event_type,
                    payload,
                }))
            }
            _ => Ok(WebhookEvent::Unknown(event_type)),
        }
    }
}

/// Axum handler for POST /webhook/stripe
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let Some(config) = &state.stripe else {
        return Err(AppError::UnsupportedProvider("stripe".to_string()));
    };

    let provider = StripeWebhookProvider {
        webhook_secret: config.webhook_secret.clone(),
    };
    handle_webhook(&provider, &state, headers, body).await
}
