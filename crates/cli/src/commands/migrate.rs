//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded into the
//! binary at compile time, so the CLI can run them anywhere the database is
//! reachable.

use super::CommandError;

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
