use reqwest::Client;
use serde::Deserialize;

use crate::config::RazorpayConfig;
use crate::error::{AppError, Result};
use crate::payments::{IntentRequest, ProviderIntent};

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
}

#[derive(Debug, Clone)]
pub struct RazorpayClient {
    client: Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(client: Client, config: &RazorpayConfig) -> Self {
        Self {
            client,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }

    /// Create a Razorpay order for a plan.
    ///
    /// Razorpay orders have no hosted checkout URL; the client opens its
    /// checkout widget against the returned `order_...` ID. That ID is what
    /// capture webhooks reconcile against.
    pub async fn create_order(&self, request: &IntentRequest) -> Result<ProviderIntent> {
        let body = serde_json::json!({
            "amount": request.amount_cents,
            "currency": request.currency.to_uppercase(),
            "notes": {
                "credgate_plan_id": request.plan_id,
                "credgate_user_id": request.user_id,
            },
        });

        let response = self
            .client
            .post("https://api.razorpay.com/v1/orders")
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Razorpay API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Razorpay API error: {}",
                error_text
            )));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse Razorpay response: {}", e))
        })?;
        let order: CreateOrderResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            AppError::Provider(format!("Failed to parse Razorpay response: {}", e))
        })?;

        Ok(ProviderIntent {
            provider_order_id: order.id,
            checkout_url: None,
            raw,
        })
    }
}
