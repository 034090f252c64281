//! HTTP surface for Credgate.

pub mod checkout;
pub mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};

use crate::db::AppState;

async fn healthz() -> &'static str {
    "ok"
}

/// Full application router. Shared by main and the integration tests.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/payments/create", post(checkout::create_payment))
        .route("/payments/{id}", get(checkout::get_payment))
        .merge(webhooks::router())
}
