//! Progressive income tax with a family quotient.
//!
//! The household's net taxable income is divided by its number of shares,
//! each bracket taxes the slice of that per-share income it covers, and the
//! per-share tax is multiplied back by the number of shares.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rental_core::FiscalYearConfig;
//! use rental_core::calculations::ProgressiveTaxCalculator;
//!
//! let config = FiscalYearConfig::france_2024();
//! let calculator = ProgressiveTaxCalculator::new(&config.brackets).unwrap();
//!
//! // 0.11 × (28797 − 11294) + 0.30 × (36000 − 28797)
//! assert_eq!(calculator.tax_due(dec!(36000), dec!(1)).unwrap(), dec!(4086.23));
//! ```

use rust_decimal::Decimal;
use tracing::trace;

use crate::calculations::TaxCalculationError;
use crate::{FiscalConfigError, TaxBracket, validate_brackets};

/// Calculator over one validated bracket schedule.
#[derive(Debug, Clone, Copy)]
pub struct ProgressiveTaxCalculator<'a> {
    brackets: &'a [TaxBracket],
}

impl<'a> ProgressiveTaxCalculator<'a> {
    /// Validates `brackets` and wraps them.
    ///
    /// # Errors
    ///
    /// Returns [`FiscalConfigError`] if the schedule is empty, does not start
    /// at zero, has gaps or overlaps, or lacks a single open-ended top bracket.
    pub fn new(brackets: &'a [TaxBracket]) -> Result<Self, FiscalConfigError> {
        validate_brackets(brackets)?;
        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &'a [TaxBracket] {
        self.brackets
    }

    /// Total tax due on `net_income` for a household of `shares` parts.
    ///
    /// Income at or below zero owes nothing. The value is not rounded.
    ///
    /// # Errors
    ///
    /// Returns [`TaxCalculationError::InvalidShares`] when `shares < 1`.
    pub fn tax_due(
        &self,
        net_income: Decimal,
        shares: Decimal,
    ) -> Result<Decimal, TaxCalculationError> {
        let quotient_income = self.quotient_income(net_income, shares)?;
        if quotient_income <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let per_share_tax: Decimal = self
            .brackets
            .iter()
            .map(|bracket| bracket.taxable_slice(quotient_income) * bracket.rate)
            .sum();

        let tax = per_share_tax * shares;
        trace!(%net_income, %shares, %quotient_income, %tax, "progressive tax");
        Ok(tax)
    }

    /// Rate of the bracket the per-share income falls into.
    ///
    /// # Errors
    ///
    /// Returns [`TaxCalculationError::InvalidShares`] when `shares < 1`.
    pub fn marginal_rate(
        &self,
        net_income: Decimal,
        shares: Decimal,
    ) -> Result<Decimal, TaxCalculationError> {
        let quotient_income = self.quotient_income(net_income, shares)?.max(Decimal::ZERO);

        let rate = self
            .brackets
            .iter()
            .find(|bracket| bracket.contains(quotient_income))
            .map_or(Decimal::ZERO, |bracket| bracket.rate);
        Ok(rate)
    }

    fn quotient_income(
        &self,
        net_income: Decimal,
        shares: Decimal,
    ) -> Result<Decimal, TaxCalculationError> {
        if shares < Decimal::ONE {
            return Err(TaxCalculationError::InvalidShares(shares));
        }
        Ok(net_income / shares)
    }
}
