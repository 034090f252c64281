//! Signature verification tests: tolerance window, tamper detection,
//! malformed header material.

use credgate::signature::{sign, verify_at, TIMESTAMP_TOLERANCE_SECS};

const SECRET: &str = "whsec_test_secret";
const NOW: i64 = 1_700_000_000;

fn signed(body: &[u8], ts: i64) -> String {
    sign(body, ts, SECRET)
}

#[test]
fn test_valid_signature_accepted() {
    let body = br#"{"type":"checkout.session.completed"}"#;
    let sig = signed(body, NOW);
    assert!(verify_at(
        NOW,
        body,
        Some(&sig),
        Some(&NOW.to_string()),
        SECRET
    ));
}

#[test]
fn test_missing_headers_rejected() {
    let body = b"{}";
    let sig = signed(body, NOW);
    assert!(!verify_at(NOW, body, None, Some(&NOW.to_string()), SECRET));
    assert!(!verify_at(NOW, body, Some(&sig), None, SECRET));
    assert!(!verify_at(NOW, body, None, None, SECRET));
}

#[test]
fn test_tolerance_boundary() {
    let body = b"{}";

    // Exactly at the boundary, both directions: accepted
    for ts in [NOW - TIMESTAMP_TOLERANCE_SECS, NOW + TIMESTAMP_TOLERANCE_SECS] {
        let sig = signed(body, ts);
        assert!(
            verify_at(NOW, body, Some(&sig), Some(&ts.to_string()), SECRET),
            "timestamp {} should be inside the window",
            ts
        );
    }

    // One second past the boundary, both directions: rejected
    for ts in [
        NOW - TIMESTAMP_TOLERANCE_SECS - 1,
        NOW + TIMESTAMP_TOLERANCE_SECS + 1,
    ] {
        let sig = signed(body, ts);
        assert!(
            !verify_at(NOW, body, Some(&sig), Some(&ts.to_string()), SECRET),
            "timestamp {} should be outside the window",
            ts
        );
    }
}

#[test]
fn test_tampered_body_rejected() {
    let body = br#"{"amount":1000}"#;
    let sig = signed(body, NOW);
    let tampered = br#"{"amount":9000}"#;
    assert!(!verify_at(
        NOW,
        tampered,
        Some(&sig),
        Some(&NOW.to_string()),
        SECRET
    ));
}

#[test]
fn test_restated_timestamp_rejected() {
    // A replayed body cannot be re-dated: the timestamp is bound into the MAC
    let body = b"{}";
    let old_ts = NOW - 10_000;
    let sig = signed(body, old_ts);
    assert!(!verify_at(
        NOW,
        body,
        Some(&sig),
        Some(&NOW.to_string()),
        SECRET
    ));
}

#[test]
fn test_single_bit_flip_rejected() {
    let body = b"{}";
    let sig = signed(body, NOW);

    let mut bytes = sig.clone().into_bytes();
    // Flip one hex digit
    bytes[0] = if bytes[0] == b'a' { b'b' } else { b'a' };
    let flipped = String::from_utf8(bytes).unwrap();
    assert_ne!(sig, flipped);
    assert!(!verify_at(
        NOW,
        body,
        Some(&flipped),
        Some(&NOW.to_string()),
        SECRET
    ));
}

#[test]
fn test_wrong_length_signature_rejected() {
    let body = b"{}";
    let sig = signed(body, NOW);
    let short = &sig[..sig.len() - 2];
    let long = format!("{}ab", sig);
    assert!(!verify_at(NOW, body, Some(short), Some(&NOW.to_string()), SECRET));
    assert!(!verify_at(NOW, body, Some(&long), Some(&NOW.to_string()), SECRET));
    assert!(!verify_at(NOW, body, Some(""), Some(&NOW.to_string()), SECRET));
}

#[test]
fn test_non_numeric_timestamp_rejected() {
    let body = b"{}";
    let sig = signed(body, NOW);
    assert!(!verify_at(NOW, body, Some(&sig), Some("soon"), SECRET));
    assert!(!verify_at(NOW, body, Some(&sig), Some(""), SECRET));
}

#[test]
fn test_wrong_secret_rejected() {
    let body = b"{}";
    let sig = signed(body, NOW);
    assert!(!verify_at(
        NOW,
        body,
        Some(&sig),
        Some(&NOW.to_string()),
        "whsec_other_secret"
    ));
}

#[test]
fn test_binary_and_unicode_payloads() {
    // Verification runs over the raw received bytes, not a parsed or
    // re-encoded form
    let binary: Vec<u8> = (0u8..=255).collect();
    let sig = signed(&binary, NOW);
    assert!(verify_at(
        NOW,
        &binary,
        Some(&sig),
        Some(&NOW.to_string()),
        SECRET
    ));

    let unicode = "{\"note\":\"\u{00e9}\u{4e16}\u{754c}\"}".as_bytes();
    let sig = signed(unicode, NOW);
    assert!(verify_at(
        NOW,
        unicode,
        Some(&sig),
        Some(&NOW.to_string()),
        SECRET
    ));
}
