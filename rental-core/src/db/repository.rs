use async_trait::async_trait;
use thiserror::Error;

use crate::models::{FiscalYearConfig, NewRentalTransaction, RentalTotals, RentalTransaction};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait RentalRepository: Send + Sync {
    // Fiscal year configuration
    async fn get_fiscal_year_config(&self, year: i32) -> Result<FiscalYearConfig, RepositoryError>;
    async fn list_fiscal_years(&self) -> Result<Vec<i32>, RepositoryError>;

    /// Inserts or replaces the configuration (and bracket schedule) of
    /// `config.tax_year`.
    async fn save_fiscal_year_config(
        &self,
        config: &FiscalYearConfig,
    ) -> Result<(), RepositoryError>;

    // Rental transactions
    async fn insert_transaction(
        &self,
        transaction: NewRentalTransaction,
    ) -> Result<RentalTransaction, RepositoryError>;

    async fn list_transactions(
        &self,
        user_id: &str,
        fiscal_year: Option<i32>,
    ) -> Result<Vec<RentalTransaction>, RepositoryError>;

    /// Rent collected and deductible charges recorded for `user_id` during
    /// `fiscal_year`. Returns zeros when nothing was recorded.
    async fn rental_totals(
        &self,
        user_id: &str,
        fiscal_year: i32,
    ) -> Result<RentalTotals, RepositoryError>;
}
