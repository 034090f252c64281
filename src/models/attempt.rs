use serde::{Deserialize, Serialize};

/// One row per checkout request, written before any external call so the
/// record survives provider outages. Attempts are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub id: String,
    pub user_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Instrument hint from the client ("card", "upi", ...). Informational.
    pub payment_method: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: AttemptStatus,
    /// Risk score at decision time. None until the scorer has run.
    pub risk_score: Option<i64>,
    pub created_at: i64,
}

/// Lifecycle of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Initiated,
    Success,
    Blocked,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Success => "success",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for AttemptStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(Self::Initiated),
            "success" => Ok(Self::Success),
            "blocked" => Ok(Self::Blocked),
            "failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
