use std::collections::BTreeMap;
use std::sync::Arc;

use rental_core::{FiscalConfigError, FiscalYearConfig, RentalRepository, RepositoryError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load fiscal configurations: {0}")]
    Repository(#[from] RepositoryError),

    #[error("fiscal configuration for {tax_year} is invalid: {source}")]
    InvalidConfig {
        tax_year: i32,
        #[source]
        source: FiscalConfigError,
    },

    #[error("default fiscal year {0} is not configured")]
    MissingDefaultYear(i32),
}

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn RentalRepository>,
    pub fiscal_years: Arc<BTreeMap<i32, FiscalYearConfig>>,
    pub default_year: i32,
}

impl AppState {
    /// Loads and validates the fiscal schedules once.
    pub async fn load(
        repository: Arc<dyn RentalRepository>,
        default_year: i32,
    ) -> Result<Self, StartupError> {
        let fiscal_years = load_fiscal_years(repository.as_ref()).await?;
        if !fiscal_years.contains_key(&default_year) {
            return Err(StartupError::MissingDefaultYear(default_year));
        }

        Ok(Self {
            repository,
            fiscal_years: Arc::new(fiscal_years),
            default_year,
        })
    }

    pub fn fiscal_year(
        &self,
        year: i32,
    ) -> Option<&FiscalYearConfig> {
        self.fiscal_years.get(&year)
    }
}

/// Every stored schedule, keyed by year. A malformed schedule aborts start-up;
/// an empty store falls back to the built-in 2024 schedule.
pub async fn load_fiscal_years(
    repository: &dyn RentalRepository,
) -> Result<BTreeMap<i32, FiscalYearConfig>, StartupError> {
    let mut configs = BTreeMap::new();
    for year in repository.list_fiscal_years().await? {
        let config = repository.get_fiscal_year_config(year).await?;
        config
            .validate()
            .map_err(|source| StartupError::InvalidConfig { tax_year: year, source })?;
        configs.insert(year, config);
    }

    if configs.is_empty() {
        warn!("no fiscal configuration stored, using the built-in 2024 schedule");
        let fallback = FiscalYearConfig::france_2024();
        configs.insert(fallback.tax_year, fallback);
    }

    info!(years = ?configs.keys().collect::<Vec<_>>(), "fiscal configurations loaded");
    Ok(configs)
}
