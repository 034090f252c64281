//! Provider gateway router and adapters.
//!
//! Adapters translate Credgate's intent request into each provider's wire
//! shape and back. They hold no business logic: persistence, risk decisions
//! and idempotency all live with the caller.

mod razorpay;
mod stripe;

pub use razorpay::*;
pub use stripe::*;

use crate::db::AppState;
use crate::error::{AppError, Result};

/// Timeout for outbound provider calls. A hung provider surfaces as
/// `AppError::Provider` and the attempt is marked failed.
pub const PROVIDER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Stripe,
    Razorpay,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Razorpay => "razorpay",
        }
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = AppError;

    /// Unknown provider names are an error, never a silent default.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stripe" => Ok(PaymentProvider::Stripe),
            "razorpay" => Ok(PaymentProvider::Razorpay),
            other => Err(AppError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the gateway needs to open a checkout with any provider.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub plan_id: String,
    pub plan_name: String,
    pub amount_cents: i64,
    pub currency: String,
    pub user_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Normalized result of intent creation across providers.
#[derive(Debug, Clone)]
pub struct ProviderIntent {
    /// Provider-side order/session ID; becomes the payment's idempotency key.
    pub provider_order_id: String,
    /// Hosted checkout URL, when the provider issues one.
    pub checkout_url: Option<String>,
    /// Raw provider response, kept for diagnostics.
    pub raw: serde_json::Value,
}

/// Create a payment intent with the requested provider.
///
/// Returns `UnsupportedProvider` when the provider is known but not
/// configured on this deployment.
pub async fn create_intent(
    state: &AppState,
    provider: PaymentProvider,
    request: &IntentRequest,
) -> Result<ProviderIntent> {
    match provider {
        PaymentProvider::Stripe => {
            let Some(config) = &state.stripe else {
                return Err(AppError::UnsupportedProvider("stripe".to_string()));
            };
            StripeClient::new(state.http_client.clone(), config)
                .create_checkout_session(request)
                .await
        }
        PaymentProvider::Razorpay => {
            let Some(config) = &state.razorpay else {
                return Err(AppError::UnsupportedProvider("razorpay".to_string()));
            };
            RazorpayClient::new(state.http_client.clone(), config)
                .create_order(request)
                .await
        }
    }
}
