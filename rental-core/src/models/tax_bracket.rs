use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One marginal-rate slice of a progressive schedule.
///
/// `lower_bound` is inclusive, `upper_bound` exclusive; `None` marks the
/// open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        lower_bound: Decimal,
        upper_bound: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
        }
    }

    /// Portion of `income` that falls inside this bracket.
    pub fn taxable_slice(
        &self,
        income: Decimal,
    ) -> Decimal {
        let ceiling = match self.upper_bound {
            Some(upper) => income.min(upper),
            None => income,
        };
        (ceiling - self.lower_bound).max(Decimal::ZERO)
    }

    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income >= self.lower_bound && self.upper_bound.is_none_or(|upper| income < upper)
    }
}
