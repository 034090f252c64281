pub mod common;
pub mod razorpay;
pub mod stripe;

pub use razorpay::handle_razorpay_webhook;
pub use stripe::handle_stripe_webhook;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook/stripe", post(handle_stripe_webhook))
        .route("/webhook/razorpay", post(handle_razorpay_webhook))
}
