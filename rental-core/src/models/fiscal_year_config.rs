//! Fiscal parameters for one tax year.
//!
//! A [`FiscalYearConfig`] is the single source of truth for the bracket
//! schedule and the flat rates used by the simulator. It is loaded from the
//! repository (or built from [`FiscalYearConfig::france_2024`]) and validated
//! once, before any calculation runs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TaxBracket;

/// Errors raised when a fiscal configuration is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FiscalConfigError {
    #[error("bracket schedule is empty")]
    NoBrackets,

    #[error("first bracket must start at 0, got {0}")]
    FirstBracketNotAtZero(Decimal),

    #[error("bracket {index} has an upper bound not above its lower bound")]
    EmptyBracket { index: usize },

    #[error("gap between bracket {index} and the next one")]
    Gap { index: usize },

    #[error("bracket {index} overlaps the next one")]
    Overlap { index: usize },

    #[error("open-ended bracket {index} is not the last bracket")]
    OpenBracketNotLast { index: usize },

    #[error("top bracket must be open-ended")]
    MissingOpenBracket,

    #[error("{name} must be between 0 and 1, got {value}")]
    InvalidRate { name: String, value: Decimal },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearConfig {
    pub tax_year: i32,

    /// Progressive income-tax schedule, ascending by lower bound.
    pub brackets: Vec<TaxBracket>,

    /// Social levies on net rental income (17.2% in 2024).
    pub social_levy_rate: Decimal,

    /// Flat professional-expense abatement on salaries (10% in 2024).
    pub salary_abattement_rate: Decimal,

    /// Flat deduction applied to gross rent under micro-foncier (30% in 2024).
    pub micro_foncier_rate: Decimal,
}

impl FiscalYearConfig {
    /// The 2024 French income-tax schedule.
    pub fn france_2024() -> Self {
        Self {
            tax_year: 2024,
            brackets: vec![
                TaxBracket::new(dec!(0), Some(dec!(11294)), dec!(0)),
                TaxBracket::new(dec!(11294), Some(dec!(28797)), dec!(0.11)),
                TaxBracket::new(dec!(28797), Some(dec!(82341)), dec!(0.30)),
                TaxBracket::new(dec!(82341), Some(dec!(177106)), dec!(0.41)),
                TaxBracket::new(dec!(177106), None, dec!(0.45)),
            ],
            social_levy_rate: dec!(0.172),
            salary_abattement_rate: dec!(0.10),
            micro_foncier_rate: dec!(0.30),
        }
    }

    /// Checks that the schedule is contiguous, starts at zero, ends with
    /// exactly one open-ended bracket, and that every rate is a fraction.
    ///
    /// # Errors
    ///
    /// Returns the first [`FiscalConfigError`] found, scanning brackets in
    /// order and then the flat rates.
    pub fn validate(&self) -> Result<(), FiscalConfigError> {
        validate_brackets(&self.brackets)?;

        for (name, value) in [
            ("social_levy_rate", self.social_levy_rate),
            ("salary_abattement_rate", self.salary_abattement_rate),
            ("micro_foncier_rate", self.micro_foncier_rate),
        ] {
            check_rate(name, value)?;
        }

        Ok(())
    }
}

/// Validates a bracket schedule on its own.
pub fn validate_brackets(brackets: &[TaxBracket]) -> Result<(), FiscalConfigError> {
    let first = brackets.first().ok_or(FiscalConfigError::NoBrackets)?;
    if first.lower_bound != Decimal::ZERO {
        return Err(FiscalConfigError::FirstBracketNotAtZero(first.lower_bound));
    }

    let last_index = brackets.len() - 1;
    for (index, bracket) in brackets.iter().enumerate() {
        check_rate(&format!("brackets[{index}].rate"), bracket.rate)?;

        match bracket.upper_bound {
            None if index != last_index => {
                return Err(FiscalConfigError::OpenBracketNotLast { index });
            }
            None => {}
            Some(_) if index == last_index => {
                return Err(FiscalConfigError::MissingOpenBracket);
            }
            Some(upper) => {
                if upper <= bracket.lower_bound {
                    return Err(FiscalConfigError::EmptyBracket { index });
                }
                let next_lower = brackets[index + 1].lower_bound;
                if next_lower > upper {
                    return Err(FiscalConfigError::Gap { index });
                }
                if next_lower < upper {
                    return Err(FiscalConfigError::Overlap { index });
                }
            }
        }
    }

    Ok(())
}

fn check_rate(
    name: &str,
    value: Decimal,
) -> Result<(), FiscalConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(FiscalConfigError::InvalidRate {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}
