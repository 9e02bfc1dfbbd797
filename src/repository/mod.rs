//! Database access layer: connection handling, migrations, and repositories.

pub mod diesel_models;
pub mod jobs;
pub mod migrations;
pub mod pool;
pub mod recipes;

pub use jobs::JobRepository;
pub use migrations::run_migrations;
pub use pool::{DbError, SqlitePool};
pub use recipes::{RecipeRepository, RecipeWrite, ResolvedIngredient};

/// Create a migrated pool backed by a temp-file SQLite database.
///
/// The TempDir must be kept alive for the duration of the test.
#[cfg(test)]
pub async fn test_pool() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let pool = SqlitePool::from_path(&db_path);
    run_migrations(pool.database_url()).await.unwrap();
    (pool, dir)
}
