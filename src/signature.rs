//! Webhook signature verification shared by all providers.
//!
//! Every provider adapter reduces its header scheme to a (signature,
//! timestamp) pair; verification itself is identical: HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` with the provider's webhook secret, hex
//! encoded, compared in constant time. The timestamp is bound into the MAC,
//! so a replayed body cannot be re-dated without invalidating the signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a webhook timestamp before it's rejected (in seconds).
/// Providers recommend 300 seconds (5 minutes).
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Verify a webhook signature against the current clock.
///
/// Fails closed: missing headers, a non-numeric timestamp, a stale or
/// future-dated timestamp, or any signature mismatch all return false.
pub fn verify(
    raw_body: &[u8],
    signature: Option<&str>,
    timestamp: Option<&str>,
    secret: &str,
) -> bool {
    verify_at(
        chrono::Utc::now().timestamp(),
        raw_body,
        signature,
        timestamp,
        secret,
    )
}

/// Verify a webhook signature against an explicit clock. Split out from
/// [`verify`] so the tolerance window is testable deterministically.
pub fn verify_at(
    now: i64,
    raw_body: &[u8],
    signature: Option<&str>,
    timestamp: Option<&str>,
    secret: &str,
) -> bool {
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        return false;
    };

    let Ok(ts) = timestamp.parse::<i64>() else {
        return false;
    };

    // Reject both stale and future-dated deliveries
    if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
        return false;
    }

    let Some(expected) = compute(raw_body, timestamp, secret) else {
        return false;
    };

    // Use constant-time comparison to prevent timing attacks.
    // An attacker could otherwise measure response times to progressively
    // discover the correct signature byte-by-byte.
    let expected_bytes = expected.as_bytes();
    let provided_bytes = signature.as_bytes();

    // Length check is not constant-time, but that's fine - signature length
    // is not secret (it's always 64 hex chars for SHA-256)
    if expected_bytes.len() != provided_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(provided_bytes).into()
}

/// Compute the hex signature for a timestamped payload. Public so tests and
/// dev webhook replay tooling can produce valid deliveries.
pub fn sign(raw_body: &[u8], timestamp: i64, secret: &str) -> String {
    // HMAC accepts keys of any length; new_from_slice cannot fail here
    compute(raw_body, &timestamp.to_string(), secret).unwrap_or_default()
}

fn compute(raw_body: &[u8], timestamp: &str, secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    Some(hex::encode(mac.finalize().into_bytes()))
}
