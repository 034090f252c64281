use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credgate::config::Config;
use credgate::db::{create_pool, init_audit_db, init_db, queries, AppState};
use credgate::handlers;
use credgate::ledger::SqliteCreditLedger;

#[derive(Parser, Debug)]
#[command(name = "credgate")]
#[command(about = "Payment webhook verification and fraud-risk gateway")]
struct Cli {
    /// Seed the database with a dev plan catalog
    #[arg(long)]
    seed: bool,
}

/// Seeds the database with dev plans for testing.
/// Only runs in dev mode and when the catalog is empty.
fn seed_dev_plans(state: &AppState) {
    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to get db connection for seeding: {}", e);
            return;
        }
    };

    match queries::list_plans(&conn) {
        Ok(plans) if !plans.is_empty() => {
            tracing::info!("Plan catalog already has data, skipping seed");
            return;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("Failed to check plan catalog: {}", e);
            return;
        }
    }

    let catalog = [
        ("Starter Pack", 500_i64, "usd", 50_i64),
        ("Builder Pack", 2000, "usd", 250),
        ("Studio Pack", 5000, "usd", 750),
    ];

    tracing::info!("Seeding dev plan catalog");
    for (name, amount_cents, currency, credits) in catalog {
        match queries::create_plan(&conn, name, amount_cents, currency, credits) {
            Ok(plan) => tracing::info!(
                "Plan: {} (id: {}, {} {} -> {} credits)",
                plan.name,
                plan.id,
                plan.amount_cents,
                plan.currency,
                plan.credits
            ),
            Err(e) => tracing::error!("Failed to seed plan {}: {}", name, e),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.stripe.is_none() && config.razorpay.is_none() {
        tracing::warn!("No payment provider configured; checkout endpoints will reject requests");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let audit_pool =
        create_pool(&config.audit_database_path).expect("Failed to create audit database pool");

    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = audit_pool.get().expect("Failed to get audit connection");
        init_audit_db(&conn).expect("Failed to initialize audit database");
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(credgate::payments::PROVIDER_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client");

    let state = AppState {
        db: db_pool.clone(),
        audit: audit_pool,
        base_url: config.base_url.clone(),
        http_client,
        stripe: config.stripe.clone(),
        razorpay: config.razorpay.clone(),
        risk_block_threshold: config.risk_block_threshold,
        ledger: Arc::new(SqliteCreditLedger::new(db_pool)),
    };

    // Purge old webhook logs on startup (0 = never purge)
    if config.webhook_log_retention_days > 0 {
        let conn = state
            .audit
            .get()
            .expect("Failed to get audit connection for purge");
        match queries::purge_old_webhook_logs(&conn, config.webhook_log_retention_days) {
            Ok(count) if count > 0 => {
                tracing::info!(
                    "Purged {} webhook log entries older than {} days",
                    count,
                    config.webhook_log_retention_days
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Failed to purge old webhook logs: {}", e);
            }
        }
    }

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set CREDGATE_ENV=dev)");
        } else {
            seed_dev_plans(&state);
        }
    }

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Credgate server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
