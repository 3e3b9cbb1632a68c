//! Net taxable rental income under the micro-foncier or réel regime.
//!
//! | Regime          | Net rental income                          |
//! |-----------------|--------------------------------------------|
//! | `MicroFoncier`  | gross rent × (1 − flat deduction rate)     |
//! | `Reel`          | max(gross rent − (charges + works), 0)     |
//!
//! No gross rent means no net income under either regime. A réel deficit is
//! floored at zero; deficit carry-forward is not modelled.

use rust_decimal::Decimal;

use crate::RentalRegime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalRegimeResolver {
    micro_foncier_rate: Decimal,
}

impl RentalRegimeResolver {
    pub fn new(micro_foncier_rate: Decimal) -> Self {
        Self { micro_foncier_rate }
    }

    pub fn net_rental_income(
        &self,
        gross_rent: Decimal,
        charges: Decimal,
        works: Decimal,
        regime: RentalRegime,
    ) -> Decimal {
        if gross_rent <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        gross_rent - self.deductible_amount(gross_rent, charges, works, regime)
    }

    /// Deduction actually applied, never more than the gross rent.
    pub fn deductible_amount(
        &self,
        gross_rent: Decimal,
        charges: Decimal,
        works: Decimal,
        regime: RentalRegime,
    ) -> Decimal {
        if gross_rent <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match regime {
            RentalRegime::MicroFoncier => gross_rent * self.micro_foncier_rate,
            RentalRegime::Reel => (charges + works).min(gross_rent),
        }
    }
}
