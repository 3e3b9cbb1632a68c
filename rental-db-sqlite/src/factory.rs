use std::path::PathBuf;

use async_trait::async_trait;
use rental_core::db::{DbConfig, RentalRepository, RepositoryError, RepositoryFactory};
use tracing::info;

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`RENTAL_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **Crate manifest dir** (`$CARGO_MANIFEST_DIR/seeds`) as last resort.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RENTAL_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// ```rust,no_run
/// use rental_core::db::RepositoryRegistry;
/// use rental_db_sqlite::SqliteRepositoryFactory;
///
/// let registry = RepositoryRegistry::new().with(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open `config.connection_string` (a path, `:memory:` or a sqlx URL),
    /// migrate it and apply the seed files from [`seeds_dir`].
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn RentalRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        repo.run_seeds(&seeds)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        info!(
            database = %config.connection_string,
            seeds = %seeds.display(),
            "sqlite repository ready"
        );
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rental_core::db::{DbConfig, RepositoryFactory};
    use rental_core::FiscalYearConfig;

    use super::SqliteRepositoryFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_seeded_in_memory_repository() {
        let repo = SqliteRepositoryFactory
            .create(&DbConfig::default())
            .await
            .expect("failed to create in-memory repository");

        let config = repo
            .get_fiscal_year_config(2024)
            .await
            .expect("seeded 2024 config");
        assert_eq!(config, FiscalYearConfig::france_2024());
    }

    #[tokio::test]
    async fn invalid_url_is_a_connection_error() {
        let result = SqliteRepositoryFactory
            .create(&DbConfig::new("sqlite", "sqlite://missing-dir/nested/x.db?mode=ro"))
            .await;

        assert!(matches!(
            result,
            Err(rental_core::RepositoryError::Connection(_))
        ));
    }
}
