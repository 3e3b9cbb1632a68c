//! Multi-year profitability projection with break-even detection.
//!
//! Each projected year takes the constant rent and charges, subtracts that
//! year's loan interest, taxes the net result at a flat effective rate and
//! adds the cashflow to a running total that starts at minus the initial
//! outlay (down payment + acquisition costs).
//!
//! The flat rate is deliberate: the projection assumes the household's
//! marginal rate stays constant over the horizon, so it never calls the
//! progressive calculator.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rental_core::ProjectionInput;
//! use rental_core::calculations::ProfitabilityProjector;
//!
//! let result = ProfitabilityProjector::project(&ProjectionInput {
//!     purchase_price: dec!(200000),
//!     loan_amount: dec!(180000),
//!     acquisition_costs: dec!(15000),
//!     annual_rent: dec!(12000),
//!     annual_charges: dec!(3600),
//!     interest_per_year: vec![dec!(7000)],
//!     horizon_years: 1,
//!     flat_tax_rate: dec!(0.30),
//!     start_year: 2024,
//! })
//! .unwrap();
//!
//! assert_eq!(result.rows[0].cumulative_cashflow, dec!(-34020.00));
//! assert_eq!(result.break_even_year, None);
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{ratio_or_zero, round_half_up, round_rate};
use crate::calculations::{TaxCalculationError, ensure_amount, ensure_rate};
use crate::{ProjectionInput, ProjectionResult, YearlyProjectionRow};

/// Stateless: the whole projection is a function of its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitabilityProjector;

impl ProfitabilityProjector {
    /// Builds the year-by-year cashflow table.
    ///
    /// Rows carry cent-rounded amounts and the running total is the sum of
    /// the rounded cashflows, so every row's cumulative cashflow equals the
    /// previous one plus its own cashflow. Break-even is read off that same
    /// total.
    ///
    /// # Errors
    ///
    /// Returns [`TaxCalculationError`] if:
    /// - any amount is negative or above [`MAX_AMOUNT`](crate::calculations::MAX_AMOUNT)
    /// - `flat_tax_rate` is outside `0..=1`
    /// - the last projected year does not fit in an `i32`
    pub fn project(input: &ProjectionInput) -> Result<ProjectionResult, TaxCalculationError> {
        validate(input)?;

        let down_payment = round_half_up(input.down_payment());
        let initial_outlay = round_half_up(input.initial_outlay());
        let mut cumulative = -initial_outlay;
        let mut break_even_year = None;
        let mut rows = Vec::new();

        for (index, year) in (0..input.horizon_years).zip(input.start_year..=i32::MAX) {
            let interest = input.interest_per_year.get(index as usize).copied().unwrap_or_default();
            let net_result = input.annual_rent - input.annual_charges - interest;
            let tax = (net_result * input.flat_tax_rate).max(Decimal::ZERO);
            let cashflow = round_half_up(net_result - tax);
            cumulative += cashflow;
            if break_even_year.is_none() && cumulative > Decimal::ZERO {
                break_even_year = Some(year);
            }

            rows.push(YearlyProjectionRow {
                year,
                gross_rent: round_half_up(input.annual_rent),
                charges: round_half_up(input.annual_charges),
                interest: round_half_up(interest),
                net_result: round_half_up(net_result),
                tax: round_half_up(tax),
                cashflow,
                cumulative_cashflow: cumulative,
            });
        }

        let invested = input.purchase_price + input.acquisition_costs;
        let net_rent = input.annual_rent - input.annual_charges;
        debug!(
            horizon = input.horizon_years,
            start_year = input.start_year,
            ?break_even_year,
            "profitability projection"
        );

        Ok(ProjectionResult {
            down_payment,
            initial_outlay,
            gross_yield: round_rate(ratio_or_zero(input.annual_rent, invested)),
            net_yield: round_rate(ratio_or_zero(net_rent, invested)),
            rows,
            break_even_year,
            final_cumulative_cashflow: cumulative,
        })
    }
}

fn validate(input: &ProjectionInput) -> Result<(), TaxCalculationError> {
    ensure_amount("purchase_price", input.purchase_price)?;
    ensure_amount("loan_amount", input.loan_amount)?;
    ensure_amount("acquisition_costs", input.acquisition_costs)?;
    ensure_amount("annual_rent", input.annual_rent)?;
    ensure_amount("annual_charges", input.annual_charges)?;
    for interest in &input.interest_per_year {
        ensure_amount("interest_per_year", *interest)?;
    }
    ensure_rate("flat_tax_rate", input.flat_tax_rate)?;

    let Some(last_offset) = input.horizon_years.checked_sub(1) else {
        return Ok(());
    };
    i32::try_from(last_offset)
        .ok()
        .and_then(|offset| input.start_year.checked_add(offset))
        .map(|_| ())
        .ok_or(TaxCalculationError::YearOutOfRange {
            start_year: input.start_year,
            horizon_years: input.horizon_years,
        })
}
