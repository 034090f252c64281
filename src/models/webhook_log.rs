use serde::{Deserialize, Serialize};

/// Append-only audit row for every inbound webhook delivery, written to the
/// separate audit database. Rows are written whether or not the signature
/// verified, so rejected deliveries remain investigable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLog {
    pub id: String,
    pub provider: String,
    /// Request headers as a JSON object.
    pub raw_headers: String,
    /// Raw request body exactly as received.
    pub payload: String,
    /// The signature header value, if any was presented.
    pub signature: Option<String>,
    pub status: WebhookLogStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookLogStatus {
    Verified,
    SignatureFailed,
}

impl WebhookLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::SignatureFailed => "signature_failed",
        }
    }
}

impl std::str::FromStr for WebhookLogStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(Self::Verified),
            "signature_failed" => Ok(Self::SignatureFailed),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for WebhookLogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
