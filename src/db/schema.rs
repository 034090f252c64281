use rusqlite::Connection;

/// Initialize the main database schema (everything except webhook logs)
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Credit packs for sale. Amounts and credits here are authoritative;
        -- the checkout surface never accepts client-supplied prices.
        CREATE TABLE IF NOT EXISTS plans (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL,
            credits INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- One row per checkout request. Written before any external call,
        -- never deleted. Feeds the risk scorer's velocity and IP signals.
        CREATE TABLE IF NOT EXISTS payment_attempts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            payment_method TEXT,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('initiated', 'success', 'blocked', 'failed')),
            risk_score INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_attempts_user_time ON payment_attempts(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_attempts_user_status ON payment_attempts(user_id, status, created_at);

        -- Payments keyed to provider orders. provider_order_id is the
        -- idempotency key for webhook reconciliation.
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            provider TEXT NOT NULL,
            provider_order_id TEXT NOT NULL UNIQUE,
            provider_payment_id TEXT,
            plan_id TEXT NOT NULL REFERENCES plans(id),
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL,
            credits INTEGER NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid', 'failed')),
            metadata TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payments_user ON payments(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_payments_order ON payments(provider, provider_order_id);

        -- Credit balances, one row per user, additive upserts only.
        CREATE TABLE IF NOT EXISTS credit_balances (
            user_id TEXT PRIMARY KEY,
            balance INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Initialize the webhook audit database (separate file to isolate growth)
pub fn init_audit_db(conn: &Connection) -> rusqlite::Result<()> {
    // WAL mode: writes are sequential appends, much faster for append-only workloads
    // synchronous=NORMAL: safe with WAL, faster than FULL
    // journal_size_limit: prevent WAL from growing indefinitely
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 1000;
        PRAGMA journal_size_limit = 67108864;

        CREATE TABLE IF NOT EXISTS webhook_logs (
            id TEXT PRIMARY KEY,
            provider TEXT NOT NULL,
            raw_headers TEXT NOT NULL,
            payload TEXT NOT NULL,
            signature TEXT,
            status TEXT NOT NULL CHECK (status IN ('verified', 'signature_failed')),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_webhook_logs_time ON webhook_logs(created_at);
        CREATE INDEX IF NOT EXISTS idx_webhook_logs_provider ON webhook_logs(provider, created_at);
        "#,
    )?;
    Ok(())
}
