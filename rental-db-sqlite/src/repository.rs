use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rental_core::{
    FiscalYearConfig, NewRentalTransaction, RentalRepository, RentalTotals, RentalTransaction,
    RepositoryError, TaxBracket, TransactionKind,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect to `database_url`, creating the database file if needed.
    ///
    /// Accepts sqlx URLs (`sqlite:rental.db`, `sqlite::memory:`) as well as
    /// bare paths and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            info!(seed = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_transaction(row: &SqliteRow) -> Result<RentalTransaction, RepositoryError> {
    let kind_str: String = row.try_get("kind").map_err(db_err)?;
    let kind = TransactionKind::parse(&kind_str).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid transaction kind: {}", kind_str))
    })?;

    Ok(RentalTransaction {
        id: row.try_get("id").map_err(db_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        property_id: row.try_get("property_id").map_err(db_err)?,
        transaction_date: row
            .try_get::<NaiveDate, _>("transaction_date")
            .map_err(|e| {
                RepositoryError::Database(format!("Failed to get transaction_date: {}", e))
            })?,
        kind,
        amount: get_decimal(row, "amount")?,
        label: row.try_get("label").map_err(db_err)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, user_id, property_id, transaction_date, kind, amount, label, created_at";

#[async_trait]
impl RentalRepository for SqliteRepository {
    async fn get_fiscal_year_config(
        &self,
        year: i32,
    ) -> Result<FiscalYearConfig, RepositoryError> {
        let row = sqlx::query(
            "SELECT tax_year, social_levy_rate, salary_abattement_rate, micro_foncier_rate
             FROM fiscal_year_config WHERE tax_year = ?",
        )
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        let bracket_rows = sqlx::query(
            "SELECT lower_bound, upper_bound, rate
             FROM tax_bracket
             WHERE tax_year = ?
             ORDER BY position",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut brackets = Vec::with_capacity(bracket_rows.len());
        for bracket in &bracket_rows {
            brackets.push(TaxBracket {
                lower_bound: get_decimal(bracket, "lower_bound")?,
                upper_bound: get_optional_decimal(bracket, "upper_bound")?,
                rate: get_decimal(bracket, "rate")?,
            });
        }

        Ok(FiscalYearConfig {
            tax_year: row.try_get("tax_year").map_err(db_err)?,
            brackets,
            social_levy_rate: get_decimal(&row, "social_levy_rate")?,
            salary_abattement_rate: get_decimal(&row, "salary_abattement_rate")?,
            micro_foncier_rate: get_decimal(&row, "micro_foncier_rate")?,
        })
    }

    async fn list_fiscal_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let rows = sqlx::query("SELECT tax_year FROM fiscal_year_config ORDER BY tax_year DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(|row| row.try_get("tax_year").map_err(db_err))
            .collect()
    }

    async fn save_fiscal_year_config(
        &self,
        config: &FiscalYearConfig,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO fiscal_year_config
                (tax_year, social_levy_rate, salary_abattement_rate, micro_foncier_rate)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (tax_year) DO UPDATE SET
                social_levy_rate = excluded.social_levy_rate,
                salary_abattement_rate = excluded.salary_abattement_rate,
                micro_foncier_rate = excluded.micro_foncier_rate",
        )
        .bind(config.tax_year)
        .bind(decimal_to_text(config.social_levy_rate))
        .bind(decimal_to_text(config.salary_abattement_rate))
        .bind(decimal_to_text(config.micro_foncier_rate))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query("DELETE FROM tax_bracket WHERE tax_year = ?")
            .bind(config.tax_year)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for (position, bracket) in config.brackets.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tax_bracket (tax_year, position, lower_bound, upper_bound, rate)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(config.tax_year)
            .bind(position as i64)
            .bind(decimal_to_text(bracket.lower_bound))
            .bind(bracket.upper_bound.map(decimal_to_text))
            .bind(decimal_to_text(bracket.rate))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        debug!(
            tax_year = config.tax_year,
            brackets = config.brackets.len(),
            "saved fiscal year config"
        );
        Ok(())
    }

    async fn insert_transaction(
        &self,
        transaction: NewRentalTransaction,
    ) -> Result<RentalTransaction, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO rental_transaction (
                user_id, property_id, transaction_date, kind, amount, label, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&transaction.user_id)
        .bind(transaction.property_id)
        .bind(transaction.transaction_date)
        .bind(transaction.kind.as_str())
        .bind(decimal_to_text(transaction.amount))
        .bind(&transaction.label)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM rental_transaction WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_transaction(&row)
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        fiscal_year: Option<i32>,
    ) -> Result<Vec<RentalTransaction>, RepositoryError> {
        let rows = match fiscal_year {
            Some(year) => {
                sqlx::query(&format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM rental_transaction
                     WHERE user_id = ? AND CAST(strftime('%Y', transaction_date) AS INTEGER) = ?
                     ORDER BY transaction_date, id"
                ))
                .bind(user_id)
                .bind(year)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM rental_transaction
                     WHERE user_id = ?
                     ORDER BY transaction_date, id"
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        rows.iter().map(row_to_transaction).collect()
    }

    async fn rental_totals(
        &self,
        user_id: &str,
        fiscal_year: i32,
    ) -> Result<RentalTotals, RepositoryError> {
        // Summed in Rust: SQLite's SUM over TEXT goes through REAL.
        let rows = sqlx::query(
            "SELECT kind, amount FROM rental_transaction
             WHERE user_id = ?
               AND CAST(strftime('%Y', transaction_date) AS INTEGER) = ?
               AND kind IN ('rent', 'deductible_charge')",
        )
        .bind(user_id)
        .bind(fiscal_year)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut totals = RentalTotals::default();
        for row in &rows {
            let kind: String = row.try_get("kind").map_err(db_err)?;
            let amount = get_decimal(row, "amount")?;
            match TransactionKind::parse(&kind) {
                Some(TransactionKind::Rent) => totals.gross_rent += amount,
                Some(TransactionKind::DeductibleCharge) => totals.deductible_charges += amount,
                Some(TransactionKind::OtherCharge) => {}
                None => {
                    return Err(RepositoryError::Database(format!(
                        "Invalid transaction kind: {}",
                        kind
                    )));
                }
            }
        }

        debug!(user_id, fiscal_year, rows = rows.len(), "computed rental totals");
        Ok(totals)
    }
}
