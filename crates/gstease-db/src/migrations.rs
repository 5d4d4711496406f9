//! Embedded schema migrations.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   products, customers, invoices, invoice_items,
//!                              stock_history, invoice_counters
//! ```
//!
//! Files are compiled into the binary by `sqlx::migrate!` and applied in
//! order on startup; `_sqlx_migrations` records what already ran. Never edit
//! a shipped migration, add `NNN_description.sql` instead.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations. Each one runs in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking for pending migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}
