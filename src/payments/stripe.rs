use reqwest::Client;
use serde::Deserialize;

use crate::config::StripeConfig;
use crate::error::{AppError, Result};
use crate::payments::{IntentRequest, ProviderIntent};

// Ad-hoc price_data per request: plans live in Credgate's own catalog, not
// in the Stripe dashboard, so there is no pre-configured Price to reference.

#[derive(Debug, Deserialize)]
struct CreateCheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(client: Client, config: &StripeConfig) -> Self {
        Self {
            client,
            secret_key: config.secret_key.clone(),
        }
    }

    /// Create a Stripe checkout session for a plan.
    ///
    /// The session ID (`cs_...`) is Stripe's order identifier; capture
    /// webhooks carry it back and it is what payments reconcile against.
    pub async fn create_checkout_session(&self, request: &IntentRequest) -> Result<ProviderIntent> {
        let amount = request.amount_cents.to_string();
        let response = self
            .client
            .post("https://api.stripe.com/v1/checkout/sessions")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("mode", "payment"),
                ("success_url", request.success_url.as_str()),
                ("cancel_url", request.cancel_url.as_str()),
                ("line_items[0][price_data][currency]", &request.currency),
                ("line_items[0][price_data][unit_amount]", &amount),
                (
                    "line_items[0][price_data][product_data][name]",
                    &request.plan_name,
                ),
                ("line_items[0][quantity]", "1"),
                ("metadata[credgate_plan_id]", &request.plan_id),
                ("metadata[credgate_user_id]", &request.user_id),
            ])
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse Stripe response: {}", e)))?;
        let session: CreateCheckoutSessionResponse = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::Provider(format!("Failed to parse Stripe response: {}", e)))?;

        Ok(ProviderIntent {
            provider_order_id: session.id,
            checkout_url: session.url,
            raw,
        })
    }
}
