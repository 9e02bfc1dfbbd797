//! Database migrations using diesel_migrations.
//!
//! Embeds migrations at compile time and runs them via a blocking task
//! to work alongside the async connections.

use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use super::pool::DbError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run pending migrations for a database URL.
///
/// Creates a sync connection and runs migrations in a blocking task.
pub async fn run_migrations(database_url: &str) -> Result<(), DbError> {
    let url = database_url
        .strip_prefix("sqlite:")
        .unwrap_or(database_url)
        .to_string();

    tokio::task::spawn_blocking(move || {
        let mut conn =
            diesel::SqliteConnection::establish(&url).map_err(super::pool::to_db_error)?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(DbError::QueryBuilderError)?;

        for migration in &applied {
            info!("Applied migration: {}", migration);
        }

        if applied.is_empty() {
            info!("No pending migrations");
        }

        Ok(())
    })
    .await
    .map_err(|e| DbError::QueryBuilderError(Box::new(e)))?
}
