//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionLedger` - append-only billing ledger
//!
//! Schema lives in `migrations/` and is applied with [`run_migrations`].

mod subscription_ledger;

pub use subscription_ledger::PostgresSubscriptionLedger;

use sqlx::PgPool;

/// Applies pending migrations from `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
