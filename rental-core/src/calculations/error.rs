use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::FiscalConfigError;

/// Largest amount accepted by the calculators. Sums, products with fractional
/// rates, and a century of cumulated cashflow all stay far inside `Decimal`'s
/// range below it.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Errors that can occur while validating or running a calculation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxCalculationError {
    /// Family quotient shares below 1 (also rules out division by zero).
    #[error("family quotient shares must be at least 1, got {0}")]
    InvalidShares(Decimal),

    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("{field} must be at most {max}, got {value}", max = MAX_AMOUNT)]
    AmountTooLarge { field: &'static str, value: Decimal },

    #[error("{field} must be between 0 and 1, got {value}")]
    RateOutOfRange { field: &'static str, value: Decimal },

    #[error("a {horizon_years}-year projection cannot start in {start_year}")]
    YearOutOfRange { start_year: i32, horizon_years: u32 },

    #[error("unknown rental regime '{0}' (expected 'micro_foncier' or 'reel')")]
    InvalidRegime(String),

    #[error("invalid fiscal configuration: {0}")]
    Configuration(#[from] FiscalConfigError),
}

/// Rejects negative amounts and amounts above [`MAX_AMOUNT`], naming the
/// offending field.
pub(crate) fn ensure_amount(
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, TaxCalculationError> {
    if value < Decimal::ZERO {
        return Err(TaxCalculationError::NegativeAmount { field, value });
    }
    if value > MAX_AMOUNT {
        return Err(TaxCalculationError::AmountTooLarge { field, value });
    }
    Ok(value)
}

pub(crate) fn ensure_rate(
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, TaxCalculationError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(TaxCalculationError::RateOutOfRange { field, value });
    }
    Ok(value)
}
