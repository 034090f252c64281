//! Credgate - payment webhook verification and fraud-risk gateway.
//!
//! Credgate sits between third-party payment providers and a user's credits
//! balance. It verifies inbound webhooks (HMAC signature + replay window),
//! scores outbound payment attempts for fraud risk, routes intent creation to
//! provider adapters, and applies credit grants exactly once per paid order.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod ledger;
pub mod models;
pub mod payments;
pub mod risk;
pub mod signature;
pub mod util;
