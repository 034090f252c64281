use serde::{Deserialize, Serialize};

/// A payment record keyed to one provider order. `provider_order_id` is the
/// idempotency key: UNIQUE in the schema, and the status CAS in
/// `queries::apply_payment_captured` keys on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    /// Provider name ("stripe", "razorpay").
    pub provider: String,
    /// Provider-side order/session ID. Webhooks reconcile against this.
    pub provider_order_id: String,
    /// Provider-side payment/charge ID, known only after capture.
    pub provider_payment_id: Option<String>,
    pub plan_id: String,
    pub amount_cents: i64,
    pub currency: String,
    /// Credits to grant on capture, copied from the plan at creation time.
    pub credits: i64,
    pub status: PaymentStatus,
    /// JSON array of webhook annotations, append-only.
    pub metadata: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Lifecycle of a payment. Only the webhook processor moves a payment out
/// of `pending`, and `paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data required to create a new payment row.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub user_id: String,
    pub provider: String,
    pub provider_order_id: String,
    pub plan_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub credits: i64,
}
