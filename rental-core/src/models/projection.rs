use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inputs of a multi-year profitability projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub purchase_price: Decimal,
    pub loan_amount: Decimal,

    /// Notary and agency fees paid at acquisition.
    pub acquisition_costs: Decimal,

    pub annual_rent: Decimal,
    pub annual_charges: Decimal,

    /// Loan interest per projected year; missing years count as zero.
    pub interest_per_year: Vec<Decimal>,

    pub horizon_years: u32,

    /// Flat effective rate applied to each year's net result.
    pub flat_tax_rate: Decimal,

    pub start_year: i32,
}

impl ProjectionInput {
    pub fn down_payment(&self) -> Decimal {
        (self.purchase_price - self.loan_amount).max(Decimal::ZERO)
    }

    pub fn initial_outlay(&self) -> Decimal {
        self.down_payment() + self.acquisition_costs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyProjectionRow {
    pub year: i32,
    pub gross_rent: Decimal,
    pub charges: Decimal,
    pub interest: Decimal,
    pub net_result: Decimal,
    pub tax: Decimal,
    pub cashflow: Decimal,
    pub cumulative_cashflow: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub down_payment: Decimal,
    pub initial_outlay: Decimal,
    pub gross_yield: Decimal,
    pub net_yield: Decimal,
    pub rows: Vec<YearlyProjectionRow>,

    /// First year whose cumulative cashflow is strictly positive.
    pub break_even_year: Option<i32>,

    pub final_cumulative_cashflow: Decimal,
}
