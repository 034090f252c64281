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

/// Razorpay webhook provider implementation.
pub struct RazorpayWebhookProvider {
    webhook_secret: String,
}

impl WebhookProvider for RazorpayWebhookProvider {
    fn provider_name(&self) -> &'static str {
        "razorpay"
    }

    fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Razorpay sends the signature and timestamp in separate headers.
    fn extract_signature(&self, headers: &HeaderMap) -> SignatureParts {
        let signature = headers
            .get("x-razorpay-signature")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let timestamp = headers
            .get("x-razorpay-timestamp")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        SignatureParts {
            header_value: signature.clone(),
            signature,
            timestamp,
        }
    }

    fn parse_event(&self, body: &Bytes) -> Result<WebhookEvent> {
        let payload: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Malformed Razorpay payload: {}", e)))?;

        let event_type = payload["event"]
            .as_str()
            .ok_or_else(|| AppError::Validation("Razorpay event missing event".to_string()))?
            .to_string();

        match event_type.as_str() {
            "payment.captured" => {
                let entity = &payload["payload"]["payment"]["entity"];
                let order_id = entity["order_id"].as_str().ok_or_else(|| {
                    AppError::Validation("Razorpay payment missing order_id".to_string())
                })?;
                let payment_id = entity["id"].as_str().ok_or_else(|| {
                    AppError::Validation("Razorpay payment missing id".to_string())
                })?;

                Ok(WebhookEvent::PaymentCaptured(CaptureData {
                    provider_order_id: order_id.to_string(),
                    provider_payment_id: payment_id.to_string(),
                    event_type,
                    payload,
                }))
            }
            "payment.failed" => {
                let order_id = payload["payload"]["payment"]["entity"]["order_id"]
                    .as_str()
                    .ok_or_else(|| {
                        AppError::Validation("Razorpay payment missing order_id".to_string())
                    })?;

                Ok(WebhookEvent::PaymentFailed(FailureData {
                    provider_order_id: order_id.to_string(),
                    event_type,
                    payload,
                }))
            }
            _ => Ok(WebhookEvent::Unknown(event_type)),
        }
    }
}

/// Axum handler for POST /webhook/razorpay
pub async fn handle_razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let Some(config) = &state.razorpay else {
        return Err(AppError::UnsupportedProvider("razorpay".to_string()));
    };

    let provider = RazorpayWebhookProvider {
        webhook_secret: config.webhook_secret.clone(),
    };
    handle_webhook(&provider, &state, headers, body).await
}
