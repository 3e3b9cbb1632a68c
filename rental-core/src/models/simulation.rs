use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::RentalRegime;

/// One single-year simulation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSimulationInput {
    pub gross_salary: Decimal,

    /// Family quotient shares (1, 1.5, 2, ...). Must be at least 1.
    pub shares: Decimal,

    /// Deductible retirement-savings (PER) contribution.
    pub per_contribution: Option<Decimal>,

    pub gross_rent: Decimal,
    pub deductible_charges: Decimal,

    /// Works and repairs already paid this year (réel only).
    pub works: Option<Decimal>,

    pub regime: RentalRegime,
    pub other_income: Option<Decimal>,

    /// Replace rent and charges with recorded totals before simulating.
    pub auto_fill: bool,
}

/// Outcome of a single-year simulation.
///
/// Every amount is rounded to the cent; rates are fractions rounded to
/// four decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    pub gross_salary: Decimal,
    pub shares: Decimal,
    pub regime: RentalRegime,
    pub gross_rent: Decimal,

    /// Salary after the flat abatement and the PER deduction.
    pub taxable_salary: Decimal,
    pub net_rental_income: Decimal,

    pub income_tax_without_rental: Decimal,
    pub income_tax_with_rental: Decimal,
    pub social_levy: Decimal,

    pub total_tax_without_rental: Decimal,
    pub total_tax_with_rental: Decimal,

    /// Tax cost attributable to the rental activity.
    pub tax_difference: Decimal,

    pub total_charges: Decimal,
    pub gross_rental_cashflow: Decimal,
    pub net_rental_cashflow: Decimal,

    pub effective_rate_without_rental: Decimal,
    pub effective_rate_with_rental: Decimal,
}
