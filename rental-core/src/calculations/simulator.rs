//! Single-year rental tax simulation.
//!
//! Computes the household's income tax twice, with and without the net
//! rental income folded in, and attributes the difference (plus social
//! levies on rental income) to the rental activity.
//!
//! # Steps
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | Taxable salary: salary − salary × abatement − PER, minimum 0 |
//! | 2    | Net rental income from the declared regime |
//! | 3    | Base income: taxable salary + other income |
//! | 4    | Income tax on base income (without rental) |
//! | 5    | Income tax on base income + net rental income (with rental) |
//! | 6    | Social levies: net rental income × levy rate |
//! | 7    | Difference: (line 5 + line 6) − line 4 |
//! | 8    | Rental cashflow: gross rent − charges − works, then − line 7 |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rental_core::calculations::TaxSimulator;
//! use rental_core::{FiscalYearConfig, RentalRegime, TaxSimulationInput};
//!
//! let config = FiscalYearConfig::france_2024();
//! let simulator = TaxSimulator::new(&config).unwrap();
//!
//! let result = simulator
//!     .simulate(&TaxSimulationInput {
//!         gross_salary: dec!(40000),
//!         shares: dec!(1),
//!         per_contribution: None,
//!         gross_rent: dec!(0),
//!         deductible_charges: dec!(0),
//!         works: None,
//!         regime: RentalRegime::MicroFoncier,
//!         other_income: None,
//!         auto_fill: false,
//!     })
//!     .unwrap();
//!
//! assert_eq!(result.taxable_salary, dec!(36000.00));
//! assert_eq!(result.income_tax_without_rental, dec!(4086.23));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{ratio_or_zero, round_half_up, round_rate};
use crate::calculations::{
    ProgressiveTaxCalculator, RentalRegimeResolver, TaxCalculationError, ensure_amount,
};
use crate::{FiscalConfigError, FiscalYearConfig, TaxCalculationResult, TaxSimulationInput};

#[derive(Debug, Clone)]
pub struct TaxSimulator<'a> {
    config: &'a FiscalYearConfig,
    calculator: ProgressiveTaxCalculator<'a>,
    resolver: RentalRegimeResolver,
}

impl<'a> TaxSimulator<'a> {
    /// Validates `config` and builds the simulator on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`FiscalConfigError`] if the configuration is malformed.
    pub fn new(config: &'a FiscalYearConfig) -> Result<Self, FiscalConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            calculator: ProgressiveTaxCalculator::new(&config.brackets)?,
            resolver: RentalRegimeResolver::new(config.micro_foncier_rate),
        })
    }

    pub fn config(&self) -> &'a FiscalYearConfig {
        self.config
    }

    /// Runs the full simulation.
    ///
    /// # Errors
    ///
    /// Returns [`TaxCalculationError`] if:
    /// - `shares` is below 1
    /// - any amount (salary, PER, rent, charges, works, other income) is negative
    ///   or above [`MAX_AMOUNT`](crate::calculations::MAX_AMOUNT)
    pub fn simulate(
        &self,
        input: &TaxSimulationInput,
    ) -> Result<TaxCalculationResult, TaxCalculationError> {
        let gross_salary = ensure_amount("gross_salary", input.gross_salary)?;
        if input.shares < Decimal::ONE {
            return Err(TaxCalculationError::InvalidShares(input.shares));
        }
        let per = ensure_amount("per_contribution", input.per_contribution.unwrap_or_default())?;
        let gross_rent = ensure_amount("gross_rent", input.gross_rent)?;
        let charges = ensure_amount("deductible_charges", input.deductible_charges)?;
        let works = ensure_amount("works", input.works.unwrap_or_default())?;
        let other_income = ensure_amount("other_income", input.other_income.unwrap_or_default())?;

        let taxable_salary = self.taxable_salary(gross_salary, per);
        let net_rental_income = self
            .resolver
            .net_rental_income(gross_rent, charges, works, input.regime);

        let base_income = taxable_salary + other_income;
        let income_with_rental = base_income + net_rental_income;

        let tax_without = self.calculator.tax_due(base_income, input.shares)?;
        let tax_with = self.calculator.tax_due(income_with_rental, input.shares)?;
        let social_levy = net_rental_income * self.config.social_levy_rate;

        let total_without = tax_without;
        let total_with = tax_with + social_levy;
        let difference = total_with - total_without;

        let total_charges = charges + works;
        let gross_cashflow = gross_rent - total_charges;
        let net_cashflow = gross_cashflow - difference;

        debug!(
            tax_year = self.config.tax_year,
            regime = %input.regime,
            %taxable_salary,
            %net_rental_income,
            %difference,
            "tax simulation"
        );

        Ok(TaxCalculationResult {
            gross_salary,
            shares: input.shares,
            regime: input.regime,
            gross_rent,
            taxable_salary: round_half_up(taxable_salary),
            net_rental_income: round_half_up(net_rental_income),
            income_tax_without_rental: round_half_up(tax_without),
            income_tax_with_rental: round_half_up(tax_with),
            social_levy: round_half_up(social_levy),
            total_tax_without_rental: round_half_up(total_without),
            total_tax_with_rental: round_half_up(total_with),
            tax_difference: round_half_up(difference),
            total_charges: round_half_up(total_charges),
            gross_rental_cashflow: round_half_up(gross_cashflow),
            net_rental_cashflow: round_half_up(net_cashflow),
            effective_rate_without_rental: round_rate(ratio_or_zero(total_without, base_income)),
            effective_rate_with_rental: round_rate(ratio_or_zero(total_with, income_with_rental)),
        })
    }

    /// Salary after the flat abatement and the PER deduction, minimum 0.
    fn taxable_salary(
        &self,
        gross_salary: Decimal,
        per: Decimal,
    ) -> Decimal {
        let abatement = gross_salary * self.config.salary_abattement_rate;
        (gross_salary - abatement - per).max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::RentalRegime;
    use crate::calculations::MAX_AMOUNT;

    fn test_input() -> TaxSimulationInput {
        TaxSimulationInput {
            gross_salary: dec!(40000),
            shares: dec!(1),
            per_contribution: None,
            gross_rent: dec!(0),
            deductible_charges: dec!(0),
            works: None,
            regime: RentalRegime::MicroFoncier,
            other_income: None,
            auto_fill: false,
        }
    }

    // =========================================================================
    // taxable_salary tests
    // =========================================================================

    #[test]
    fn taxable_salary_applies_abatement() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();

        let result = simulator.taxable_salary(dec!(40000), dec!(0));

        assert_eq!(result, dec!(36000));
    }

    #[test]
    fn taxable_salary_subtracts_per() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();

        let result = simulator.taxable_salary(dec!(40000), dec!(3000));

        assert_eq!(result, dec!(33000));
    }

    #[test]
    fn taxable_salary_floors_at_zero() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();

        let result = simulator.taxable_salary(dec!(10000), dec!(20000));

        assert_eq!(result, dec!(0));
    }

    // =========================================================================
    // simulate tests
    // =========================================================================

    #[test]
    fn simulate_salary_only() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();

        let result = simulator.simulate(&test_input()).unwrap();

        assert_eq!(result.taxable_salary, dec!(36000.00));
        assert_eq!(result.net_rental_income, dec!(0.00));
        assert_eq!(result.income_tax_without_rental, dec!(4086.23));
        assert_eq!(result.income_tax_with_rental, dec!(4086.23));
        assert_eq!(result.social_levy, dec!(0.00));
        assert_eq!(result.tax_difference, dec!(0.00));
        // 4086.23 / 36000
        assert_eq!(result.effective_rate_without_rental, dec!(0.1135));
    }

    #[test]
    fn simulate_micro_foncier_rent() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.gross_rent = dec!(12000);

        let result = simulator.simulate(&input).unwrap();

        assert_eq!(result.net_rental_income, dec!(8400.00));
        // 36000 + 8400 = 44400; 1925.33 + 0.30 × (44400 − 28797) = 1925.33 + 4680.90
        assert_eq!(result.income_tax_with_rental, dec!(6606.23));
        // 8400 × 17.2%
        assert_eq!(result.social_levy, dec!(1444.80));
        assert_eq!(result.total_tax_with_rental, dec!(8051.03));
        // 2520 income tax + 1444.80 levies
        assert_eq!(result.tax_difference, dec!(3964.80));
        assert_eq!(result.gross_rental_cashflow, dec!(12000.00));
        assert_eq!(result.net_rental_cashflow, dec!(8035.20));
    }

    #[test]
    fn simulate_reel_rent_with_charges_and_works() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.regime = RentalRegime::Reel;
        input.gross_rent = dec!(12000);
        input.deductible_charges = dec!(4000);
        input.works = Some(dec!(1000));

        let result = simulator.simulate(&input).unwrap();

        assert_eq!(result.net_rental_income, dec!(7000.00));
        assert_eq!(result.total_charges, dec!(5000.00));
        assert_eq!(result.gross_rental_cashflow, dec!(7000.00));
        // 7000 × 30% marginal + 7000 × 17.2%
        assert_eq!(result.tax_difference, dec!(3304.00));
        assert_eq!(result.net_rental_cashflow, dec!(3696.00));
    }

    #[test]
    fn simulate_counts_other_income_in_both_scenarios() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.gross_salary = dec!(0);
        input.other_income = Some(dec!(36000));

        let result = simulator.simulate(&input).unwrap();

        assert_eq!(result.income_tax_without_rental, dec!(4086.23));
        assert_eq!(result.income_tax_with_rental, dec!(4086.23));
    }

    #[test]
    fn simulate_with_no_income_has_zero_rates() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.gross_salary = dec!(0);

        let result = simulator.simulate(&input).unwrap();

        assert_eq!(result.total_tax_with_rental, dec!(0.00));
        assert_eq!(result.effective_rate_without_rental, dec!(0));
        assert_eq!(result.effective_rate_with_rental, dec!(0));
    }

    #[test]
    fn simulate_quotient_lowers_tax() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut family = test_input();
        family.shares = dec!(2.5);

        let single = simulator.simulate(&test_input()).unwrap();
        let family = simulator.simulate(&family).unwrap();

        assert!(family.income_tax_without_rental < single.income_tax_without_rental);
    }

    #[test]
    fn simulate_rejects_shares_below_one() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.shares = dec!(0);

        let result = simulator.simulate(&input);

        assert_eq!(result, Err(TaxCalculationError::InvalidShares(dec!(0))));
    }

    #[test]
    fn simulate_rejects_negative_salary() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.gross_salary = dec!(-1);

        let result = simulator.simulate(&input);

        assert_eq!(
            result,
            Err(TaxCalculationError::NegativeAmount {
                field: "gross_salary",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn simulate_rejects_negative_charges() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.deductible_charges = dec!(-250);

        let result = simulator.simulate(&input);

        assert!(matches!(
            result,
            Err(TaxCalculationError::NegativeAmount {
                field: "deductible_charges",
                ..
            })
        ));
    }

    #[test]
    fn simulate_rejects_amounts_beyond_the_supported_range() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.gross_salary = dec!(70000000000000000000000000000);
        input.gross_rent = dec!(70000000000000000000000000000);
        input.other_income = Some(dec!(70000000000000000000000000000));

        let result = simulator.simulate(&input);

        assert_eq!(
            result,
            Err(TaxCalculationError::AmountTooLarge {
                field: "gross_salary",
                value: dec!(70000000000000000000000000000),
            })
        );
    }

    #[test]
    fn simulate_accepts_the_largest_supported_amounts() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let input = TaxSimulationInput {
            gross_salary: MAX_AMOUNT,
            shares: dec!(1),
            per_contribution: Some(MAX_AMOUNT),
            gross_rent: MAX_AMOUNT,
            deductible_charges: MAX_AMOUNT,
            works: Some(MAX_AMOUNT),
            regime: RentalRegime::Reel,
            other_income: Some(MAX_AMOUNT),
            auto_fill: false,
        };

        let result = simulator.simulate(&input).unwrap();

        assert_eq!(result.net_rental_income, dec!(0.00));
        assert_eq!(result.total_charges, dec!(2000000000000000.00));
        assert!(result.income_tax_without_rental > Decimal::ZERO);
    }

    #[test]
    fn simulate_is_idempotent() {
        let config = FiscalYearConfig::france_2024();
        let simulator = TaxSimulator::new(&config).unwrap();
        let mut input = test_input();
        input.gross_rent = dec!(9600);
        input.shares = dec!(1.5);

        assert_eq!(simulator.simulate(&input), simulator.simulate(&input));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = FiscalYearConfig::france_2024();
        config.social_levy_rate = dec!(17.2);

        let result = TaxSimulator::new(&config);

        assert!(matches!(
            result,
            Err(FiscalConfigError::InvalidRate { .. })
        ));
    }
}
