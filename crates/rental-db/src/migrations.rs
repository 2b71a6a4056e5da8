//! Embedded schema migrations.
//!
//! Files under `migrations/sqlite/` are compiled into the binary and applied
//! in filename order. Applied versions are tracked in `_sqlx_migrations`.
//! Existing files are never edited; schema changes go in a new numbered file.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   products, product_components, orders,
//!                              order_items, reviews, favorites,
//!                              product_interactions, product_demand_analytics
//! ```

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
