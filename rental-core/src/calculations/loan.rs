//! Yearly interest of a fixed-instalment amortising loan.
//!
//! Feeds [`ProjectionInput::interest_per_year`](crate::ProjectionInput) when
//! the caller knows the loan terms rather than the interest table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::round_half_up;

const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoanScheduleError {
    #[error("loan principal must not be negative, got {0}")]
    NegativePrincipal(Decimal),

    #[error("loan rate must not be negative, got {0}")]
    NegativeRate(Decimal),

    #[error("loan duration must be at least one year")]
    ZeroDuration,

    #[error("loan terms are too large to amortise")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub principal: Decimal,

    /// Nominal annual rate as a fraction, compounded monthly.
    pub annual_rate: Decimal,

    pub duration_years: u32,
}

impl LoanSchedule {
    /// Constant monthly instalment (principal + interest), unrounded.
    ///
    /// # Errors
    ///
    /// Returns [`LoanScheduleError`] for a negative principal or rate, a
    /// zero duration on a non-zero principal, or terms whose compounded
    /// growth does not fit in a [`Decimal`].
    pub fn monthly_payment(&self) -> Result<Decimal, LoanScheduleError> {
        self.validate()?;
        if self.principal.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let months = self.months();
        let rate = self.monthly_rate();
        if rate.is_zero() {
            return Ok(self.principal / Decimal::from(months));
        }

        let step = Decimal::ONE + rate;
        let mut growth = Decimal::ONE;
        for _ in 0..months {
            growth = growth.checked_mul(step).ok_or(LoanScheduleError::Overflow)?;
        }
        self.principal
            .checked_mul(rate)
            .and_then(|scaled| scaled.checked_mul(growth))
            .and_then(|numerator| numerator.checked_div(growth - Decimal::ONE))
            .ok_or(LoanScheduleError::Overflow)
    }

    /// Interest paid in each loan year, rounded to the cent.
    ///
    /// # Errors
    ///
    /// Same conditions as [`LoanSchedule::monthly_payment`].
    pub fn yearly_interest(&self) -> Result<Vec<Decimal>, LoanScheduleError> {
        let payment = self.monthly_payment()?;
        let rate = self.monthly_rate();

        let mut balance = self.principal;
        let mut years = Vec::with_capacity(self.duration_years as usize);
        for _ in 0..self.duration_years {
            let mut interest_this_year = Decimal::ZERO;
            for _ in 0..MONTHS_PER_YEAR {
                let interest = balance * rate;
                interest_this_year += interest;
                balance = (balance - (payment - interest)).max(Decimal::ZERO);
            }
            years.push(round_half_up(interest_this_year));
        }

        Ok(years)
    }

    fn validate(&self) -> Result<(), LoanScheduleError> {
        if self.principal < Decimal::ZERO {
            return Err(LoanScheduleError::NegativePrincipal(self.principal));
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(LoanScheduleError::NegativeRate(self.annual_rate));
        }
        if self.duration_years == 0 && !self.principal.is_zero() {
            return Err(LoanScheduleError::ZeroDuration);
        }
        Ok(())
    }

    fn months(&self) -> u32 {
        self.duration_years * MONTHS_PER_YEAR
    }

    fn monthly_rate(&self) -> Decimal {
        self.annual_rate / Decimal::from(MONTHS_PER_YEAR)
    }
}
