use serde::{Deserialize, Serialize};

/// A purchasable credits pack. The plan row is the authoritative source for
/// the amount charged and the credits granted; client-supplied amounts are
/// never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    /// Price in the smallest currency unit (cents, paise).
    pub amount_cents: i64,
    /// ISO 4217 currency code, lowercase (e.g., "usd", "inr").
    pub currency: String,
    /// Credits granted when a payment for this plan is captured.
    pub credits: i64,
    pub created_at: i64,
}
