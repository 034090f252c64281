use std::env;

use crate::error::{AppError, Result};

/// Stripe credentials. Present only when fully configured.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

/// Razorpay credentials. Present only when fully configured.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub audit_database_path: String,
    pub base_url: String,
    pub dev_mode: bool,
    pub stripe: Option<StripeConfig>,
    pub razorpay: Option<RazorpayConfig>,
    /// Risk score above which a checkout attempt is blocked.
    pub risk_block_threshold: u8,
    /// Days to keep webhook audit rows. 0 keeps them forever.
    pub webhook_log_retention_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("CREDGATE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let stripe = Self::stripe_from_env()?;
        let razorpay = Self::razorpay_from_env()?;

        let risk_block_threshold = env::var("RISK_BLOCK_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(80);

        let webhook_log_retention_days = env::var("WEBHOOK_LOG_RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Ok(Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "credgate.db".to_string()),
            audit_database_path: env::var("AUDIT_DATABASE_PATH")
                .unwrap_or_else(|_| "credgate_audit.db".to_string()),
            base_url,
            dev_mode,
            stripe,
            razorpay,
            risk_block_threshold,
            webhook_log_retention_days,
        })
    }

    /// Partial configuration is a startup error, not a silently disabled
    /// provider. A missing webhook secret with a present API key would
    /// otherwise only surface on the first live webhook.
    fn stripe_from_env() -> Result<Option<StripeConfig>> {
        let secret_key = env::var("STRIPE_SECRET_KEY").ok();
        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").ok();

        match (secret_key, webhook_secret) {
            (Some(secret_key), Some(webhook_secret)) => Ok(Some(StripeConfig {
                secret_key,
                webhook_secret,
            })),
            (None, None) => Ok(None),
            _ => Err(AppError::Internal(
                "Stripe is partially configured: set both STRIPE_SECRET_KEY and \
                 STRIPE_WEBHOOK_SECRET, or neither"
                    .to_string(),
            )),
        }
    }

    fn razorpay_from_env() -> Result<Option<RazorpayConfig>> {
        let key_id = env::var("RAZORPAY_KEY_ID").ok();
        let key_secret = env::var("RAZORPAY_KEY_SECRET").ok();
        let webhook_secret = env::var("RAZORPAY_WEBHOOK_SECRET").ok();

        match (key_id, key_secret, webhook_secret) {
            (Some(key_id), Some(key_secret), Some(webhook_secret)) => Ok(Some(RazorpayConfig {
                key_id,
                key_secret,
                webhook_secret,
            })),
            (None, None, None) => Ok(None),
            _ => Err(AppError::Internal(
                "Razorpay is partially configured: set RAZORPAY_KEY_ID, \
                 RAZORPAY_KEY_SECRET and RAZORPAY_WEBHOOK_SECRET together, or none"
                    .to_string(),
            )),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
