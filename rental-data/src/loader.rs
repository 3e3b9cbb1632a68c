use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use rental_core::{
    FiscalConfigError, FiscalYearConfig, NewRentalTransaction, RentalRepository, RepositoryError,
    TaxBracket, TransactionKind,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading fiscal or rental data.
#[derive(Debug, Error)]
pub enum FiscalLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Tax year {0} has brackets but no parameters row")]
    MissingParameters(i32),

    #[error("Tax year {0} has parameters but no brackets")]
    MissingBrackets(i32),

    #[error("Tax year {0} appears more than once in the parameters file")]
    DuplicateParameters(i32),

    #[error("Invalid schedule for tax year {tax_year}: {source}")]
    InvalidConfig {
        tax_year: i32,
        #[source]
        source: FiscalConfigError,
    },

    #[error("Invalid transaction on row {row}: {message}")]
    InvalidTransaction { row: usize, message: String },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for FiscalLoaderError {
    fn from(err: csv::Error) -> Self {
        FiscalLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of the bracket schedule CSV.
///
/// An empty `upper_bound` marks the open-ended top bracket.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub lower_bound: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

/// A single row of the fiscal parameters CSV. One row per tax year.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParameterRecord {
    pub tax_year: i32,
    pub social_levy_rate: Decimal,
    pub salary_abattement_rate: Decimal,
    pub micro_foncier_rate: Decimal,
}

/// A single row of the rental transactions CSV.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub user_id: String,
    pub property_id: Option<i64>,
    pub date: NaiveDate,
    pub kind: String,
    pub amount: Decimal,
    #[serde(default)]
    pub label: String,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_records<T, R>(reader: R) -> Result<Vec<T>, FiscalLoaderError>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let record: T = result?;
        records.push(record);
    }

    Ok(records)
}

/// Loader for yearly fiscal schedules.
///
/// A schedule is split across two CSV files: the brackets and the flat
/// parameters. Both are joined on `tax_year`, validated, and only then
/// written through [`RentalRepository::save_fiscal_year_config`].
pub struct FiscalScheduleLoader;

impl FiscalScheduleLoader {
    pub fn parse_brackets<R: Read>(reader: R) -> Result<Vec<BracketRecord>, FiscalLoaderError> {
        parse_records(reader)
    }

    pub fn parse_parameters<R: Read>(
        reader: R
    ) -> Result<Vec<ParameterRecord>, FiscalLoaderError> {
        parse_records(reader)
    }

    /// Join bracket and parameter rows into validated configurations,
    /// ordered by tax year. Brackets are sorted by lower bound.
    pub fn build(
        brackets: &[BracketRecord],
        parameters: &[ParameterRecord],
    ) -> Result<Vec<FiscalYearConfig>, FiscalLoaderError> {
        let mut by_year: BTreeMap<i32, Vec<TaxBracket>> = BTreeMap::new();
        for record in brackets {
            by_year
                .entry(record.tax_year)
                .or_default()
                .push(TaxBracket::new(record.lower_bound, record.upper_bound, record.rate));
        }

        let mut params_by_year: BTreeMap<i32, &ParameterRecord> = BTreeMap::new();
        for record in parameters {
            if params_by_year.insert(record.tax_year, record).is_some() {
                return Err(FiscalLoaderError::DuplicateParameters(record.tax_year));
            }
        }

        if let Some(year) = by_year.keys().find(|year| !params_by_year.contains_key(year)) {
            return Err(FiscalLoaderError::MissingParameters(*year));
        }

        let mut configs = Vec::with_capacity(params_by_year.len());
        for (tax_year, params) in params_by_year {
            let mut brackets = by_year
                .remove(&tax_year)
                .ok_or(FiscalLoaderError::MissingBrackets(tax_year))?;
            brackets.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));

            let config = FiscalYearConfig {
                tax_year,
                brackets,
                social_levy_rate: params.social_levy_rate,
                salary_abattement_rate: params.salary_abattement_rate,
                micro_foncier_rate: params.micro_foncier_rate,
            };
            config
                .validate()
                .map_err(|source| FiscalLoaderError::InvalidConfig { tax_year, source })?;
            configs.push(config);
        }

        Ok(configs)
    }

    /// Save each configuration, replacing any stored version of the same
    /// year. Returns the number of years written.
    pub async fn load<R: RentalRepository + ?Sized>(
        repo: &R,
        configs: &[FiscalYearConfig],
    ) -> Result<usize, FiscalLoaderError> {
        for config in configs {
            repo.save_fiscal_year_config(config).await?;
            info!(
                tax_year = config.tax_year,
                brackets = config.brackets.len(),
                "loaded fiscal year"
            );
        }
        Ok(configs.len())
    }
}

/// Loader for recorded rental transactions.
///
/// Rows are appended; loading the same file twice records every row twice.
pub struct TransactionLoader;

impl TransactionLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, FiscalLoaderError> {
        parse_records(reader)
    }

    /// Convert parsed rows, rejecting unknown kinds and negative amounts.
    /// Row numbers are 1-based and exclude the header.
    pub fn to_new_transactions(
        records: &[TransactionRecord]
    ) -> Result<Vec<NewRentalTransaction>, FiscalLoaderError> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let row = index + 1;
                let kind = TransactionKind::parse(record.kind.trim()).ok_or_else(|| {
                    FiscalLoaderError::InvalidTransaction {
                        row,
                        message: format!("unknown kind '{}'", record.kind),
                    }
                })?;
                if record.amount < Decimal::ZERO {
                    return Err(FiscalLoaderError::InvalidTransaction {
                        row,
                        message: format!("negative amount {}", record.amount),
                    });
                }
                if record.user_id.is_empty() {
                    return Err(FiscalLoaderError::InvalidTransaction {
                        row,
                        message: "missing user_id".to_string(),
                    });
                }

                Ok(NewRentalTransaction {
                    user_id: record.user_id.clone(),
                    property_id: record.property_id,
                    transaction_date: record.date,
                    kind,
                    amount: record.amount,
                    label: record.label.clone(),
                })
            })
            .collect()
    }

    /// Validate every row, then insert them in file order.
    pub async fn load<R: RentalRepository + ?Sized>(
        repo: &R,
        records: &[TransactionRecord],
    ) -> Result<usize, FiscalLoaderError> {
        let transactions = Self::to_new_transactions(records)?;
        for transaction in transactions.iter().cloned() {
            let stored = repo.insert_transaction(transaction).await?;
            debug!(id = stored.id, user_id = %stored.user_id, "inserted transaction");
        }
        Ok(transactions.len())
    }
}
