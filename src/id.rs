//! Prefixed ID generation for Credgate entities.
//!
//! All IDs use a `cg_` brand prefix to guarantee collision avoidance with
//! payment provider IDs (Stripe's `cs_`, `pi_`, Razorpay's `order_`,
//! `pay_`, etc.).
//!
//! Format: `cg_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &["cg_att_", "cg_pay_", "cg_plan_", "cg_whl_"];

/// Validate that a string is a valid Credgate prefixed ID.
///
/// This is a cheap check to reject garbage before hitting the database.
/// Validates format: `cg_{entity}_{32_hex_chars}`
pub fn is_valid_prefixed_id(s: &str) -> bool {
    // Must start with a known prefix
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    // Get the hex part after the prefix
    let hex_part = &s[prefix.len()..];

    // Must be exactly 32 hex characters
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs in Credgate.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    PaymentAttempt,
    Payment,
    Plan,
    WebhookLog,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::PaymentAttempt => "cg_att",
            Self::Payment => "cg_pay",
            Self::Plan => "cg_plan",
            Self::WebhookLog => "cg_whl",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = EntityType::Payment.gen_id();
        assert!(id.starts_with("cg_pay_"));
        // cg_pay_ (7 chars) + 32 hex chars = 39 chars total
        assert_eq!(id.len(), 39);
    }

    #[test]
    fn test_all_prefixes_unique() {
        let prefixes: Vec<&str> = vec![
            EntityType::PaymentAttempt.prefix(),
            EntityType::Payment.prefix(),
            EntityType::Plan.prefix(),
            EntityType::WebhookLog.prefix(),
        ];

        let mut seen = std::collections::HashSet::new();
        for prefix in prefixes {
            assert!(seen.insert(prefix), "Duplicate prefix found: {}", prefix);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let id1 = EntityType::Payment.gen_id();
        let id2 = EntityType::Payment.gen_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_is_valid_prefixed_id() {
        // Valid IDs
        assert!(is_valid_prefixed_id(
            "cg_pay_a1b2c3d4e5f6789012345678901234ab"
        ));
        assert!(is_valid_prefixed_id(
            "cg_att_00000000000000000000000000000000"
        ));

        // Generated IDs should be valid
        assert!(is_valid_prefixed_id(&EntityType::Payment.gen_id()));
        assert!(is_valid_prefixed_id(&EntityType::Plan.gen_id()));
        assert!(is_valid_prefixed_id(&EntityType::WebhookLog.gen_id()));

        // Invalid IDs
        assert!(!is_valid_prefixed_id("")); // empty
        assert!(!is_valid_prefixed_id(
            "a1b2c3d4-e5f6-7890-1234-567890123456"
        )); // plain UUID
        assert!(!is_valid_prefixed_id(
            "cg_unknown_a1b2c3d4e5f6789012345678901234ab"
        )); // unknown prefix
        assert!(!is_valid_prefixed_id("cg_pay_a1b2c3d4")); // too short
        assert!(!is_valid_prefixed_id(
            "cg_pay_a1b2c3d4e5f6789012345678901234gg"
        )); // non-hex
        assert!(!is_valid_prefixed_id(
            "pay_a1b2c3d4e5f6789012345678901234ab"
        )); // missing cg_
    }
}
