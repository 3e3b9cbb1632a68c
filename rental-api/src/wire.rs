//! JSON request and response bodies.
//!
//! Requests use the French field names of the simulator form (English
//! aliases accepted) and are converted into engine inputs here, so that
//! handlers only deal with validated values. Responses carry amounts as JSON
//! numbers.

use chrono::{Datelike, NaiveDate};
use rental_core::calculations::{LoanSchedule, ProgressiveTaxCalculator};
use rental_core::{
    FiscalYearConfig, ProjectionInput, ProjectionResult, RentalRegime, TaxBracket,
    TaxCalculationResult, TaxSimulationInput, YearlyProjectionRow,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const DEFAULT_HORIZON_YEARS: u32 = 20;
const MAX_HORIZON_YEARS: u32 = 100;
const START_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

fn required(
    value: Option<Decimal>,
    field: &str,
) -> Result<Decimal, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

fn non_negative(
    value: Decimal,
    field: &str,
) -> Result<Decimal, ApiError> {
    if value < Decimal::ZERO {
        return Err(ApiError::BadRequest(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(value)
}

fn fraction(
    value: Decimal,
    field: &str,
) -> Result<Decimal, ApiError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ApiError::BadRequest(format!(
            "{field} must be between 0 and 1, got {value}"
        )));
    }
    Ok(value)
}

// ============================================================================
// POST /api/tax/simulate
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatePayload {
    #[serde(alias = "gross_salary")]
    pub salaire_brut_annuel: Option<Decimal>,
    #[serde(alias = "shares")]
    pub parts_quotient_familial: Option<Decimal>,
    #[serde(alias = "per_contribution")]
    pub versement_per: Option<Decimal>,
    #[serde(alias = "gross_rent")]
    pub loyers_percus: Option<Decimal>,
    #[serde(alias = "deductible_charges")]
    pub charges_deductibles: Option<Decimal>,
    #[serde(alias = "works")]
    pub travaux_deja_effectues: Option<Decimal>,
    #[serde(alias = "regime")]
    pub regime_fiscal: Option<String>,
    #[serde(alias = "other_income")]
    pub autres_revenus: Option<Decimal>,
    pub auto_fill: bool,
    pub user_id: Option<String>,
    #[serde(alias = "year")]
    pub annee: Option<i32>,
}

/// A simulation request after field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulateRequest {
    pub input: TaxSimulationInput,
    pub year: Option<i32>,
    /// Set whenever `input.auto_fill` is.
    pub user_id: Option<String>,
}

impl SimulatePayload {
    /// Checks presence and signs. Shares are range-checked by the engine.
    ///
    /// A missing regime means micro-foncier.
    pub fn into_request(self) -> Result<SimulateRequest, ApiError> {
        let gross_salary = non_negative(
            required(self.salaire_brut_annuel, "salaire_brut_annuel")?,
            "salaire_brut_annuel",
        )?;
        let shares = required(self.parts_quotient_familial, "parts_quotient_familial")?;

        let regime = match self.regime_fiscal.as_deref() {
            Some(code) => code.parse::<RentalRegime>()?,
            None => RentalRegime::MicroFoncier,
        };

        let user_id = self.user_id.filter(|id| !id.trim().is_empty());
        if self.auto_fill && user_id.is_none() {
            return Err(ApiError::BadRequest(
                "user_id is required when auto_fill is set".to_string(),
            ));
        }

        Ok(SimulateRequest {
            input: TaxSimulationInput {
                gross_salary,
                shares,
                per_contribution: self.versement_per,
                gross_rent: self.loyers_percus.unwrap_or_default(),
                deductible_charges: self.charges_deductibles.unwrap_or_default(),
                works: self.travaux_deja_effectues,
                regime,
                other_income: self.autres_revenus,
                auto_fill: self.auto_fill,
            },
            year: self.annee,
            user_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResponse {
    pub tax_year: i32,
    pub auto_filled: bool,
    pub regime: RentalRegime,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_salary: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shares: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_rent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub taxable_salary: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_rental_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub income_tax_without_rental: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub income_tax_with_rental: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub social_levy: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_tax_without_rental: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_tax_with_rental: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_difference: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_charges: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_rental_cashflow: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_rental_cashflow: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub effective_rate_without_rental: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub effective_rate_with_rental: Decimal,
}

impl SimulationResponse {
    pub fn new(
        tax_year: i32,
        auto_filled: bool,
        result: &TaxCalculationResult,
    ) -> Self {
        Self {
            tax_year,
            auto_filled,
            regime: result.regime,
            gross_salary: result.gross_salary,
            shares: result.shares,
            gross_rent: result.gross_rent,
            taxable_salary: result.taxable_salary,
            net_rental_income: result.net_rental_income,
            income_tax_without_rental: result.income_tax_without_rental,
            income_tax_with_rental: result.income_tax_with_rental,
            social_levy: result.social_levy,
            total_tax_without_rental: result.total_tax_without_rental,
            total_tax_with_rental: result.total_tax_with_rental,
            tax_difference: result.tax_difference,
            total_charges: result.total_charges,
            gross_rental_cashflow: result.gross_rental_cashflow,
            net_rental_cashflow: result.net_rental_cashflow,
            effective_rate_without_rental: result.effective_rate_without_rental,
            effective_rate_with_rental: result.effective_rate_with_rental,
        }
    }
}

// ============================================================================
// GET /api/tax/config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub lower_bound: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub upper_bound: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

impl From<&TaxBracket> for BracketResponse {
    fn from(bracket: &TaxBracket) -> Self {
        Self {
            lower_bound: bracket.lower_bound,
            upper_bound: bracket.upper_bound,
            rate: bracket.rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigResponse {
    pub tax_year: i32,
    pub tax_brackets: Vec<BracketResponse>,
    #[serde(with = "rust_decimal::serde::float")]
    pub social_security_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub abattement_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub micro_foncier_rate: Decimal,
}

impl From<&FiscalYearConfig> for ConfigResponse {
    fn from(config: &FiscalYearConfig) -> Self {
        Self {
            tax_year: config.tax_year,
            tax_brackets: config.brackets.iter().map(BracketResponse::from).collect(),
            social_security_rate: config.social_levy_rate,
            abattement_rate: config.salary_abattement_rate,
            micro_foncier_rate: config.micro_foncier_rate,
        }
    }
}

// ============================================================================
// POST /api/profitability/projection
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectionPayload {
    #[serde(alias = "purchase_price")]
    pub prix_achat: Option<Decimal>,
    #[serde(alias = "loan_amount")]
    pub montant_emprunt: Option<Decimal>,
    #[serde(alias = "acquisition_costs")]
    pub frais_acquisition: Option<Decimal>,
    #[serde(alias = "annual_rent")]
    pub loyer_annuel: Option<Decimal>,
    #[serde(alias = "annual_charges")]
    pub charges_annuelles: Option<Decimal>,
    #[serde(alias = "flat_tax_rate")]
    pub taux_imposition: Option<Decimal>,
    /// Used with `parts_quotient_familial` to derive the flat rate when
    /// `taux_imposition` is absent.
    #[serde(alias = "taxable_income")]
    pub revenu_imposable: Option<Decimal>,
    #[serde(alias = "shares")]
    pub parts_quotient_familial: Option<Decimal>,
    #[serde(alias = "horizon_years")]
    pub duree_projection: Option<u32>,
    #[serde(alias = "interest_per_year")]
    pub interets_annuels: Option<Vec<Decimal>>,
    #[serde(alias = "loan_rate")]
    pub taux_emprunt: Option<Decimal>,
    #[serde(alias = "loan_duration_years")]
    pub duree_emprunt: Option<u32>,
    #[serde(alias = "start_year")]
    pub annee_debut: Option<i32>,
    #[serde(alias = "purchase_date")]
    pub date_achat: Option<NaiveDate>,
}

impl ProjectionPayload {
    /// Resolves defaults and derived values into a [`ProjectionInput`].
    ///
    /// * interest: the explicit array, else the amortisation of
    ///   `montant_emprunt` at `taux_emprunt` over `duree_emprunt`, else none;
    /// * flat rate: `taux_imposition`, else the marginal bracket rate of
    ///   `revenu_imposable` plus the social levy rate of `config`;
    /// * start year: `annee_debut`, else the year of `date_achat`, else
    ///   `current_year`.
    pub fn into_input(
        self,
        config: &FiscalYearConfig,
        current_year: i32,
    ) -> Result<ProjectionInput, ApiError> {
        let purchase_price =
            non_negative(required(self.prix_achat, "prix_achat")?, "prix_achat")?;
        let annual_rent =
            non_negative(required(self.loyer_annuel, "loyer_annuel")?, "loyer_annuel")?;
        let loan_amount =
            non_negative(self.montant_emprunt.unwrap_or_default(), "montant_emprunt")?;
        let acquisition_costs =
            non_negative(self.frais_acquisition.unwrap_or_default(), "frais_acquisition")?;
        let annual_charges =
            non_negative(self.charges_annuelles.unwrap_or_default(), "charges_annuelles")?;

        let horizon_years = self.duree_projection.unwrap_or(DEFAULT_HORIZON_YEARS);
        if horizon_years > MAX_HORIZON_YEARS {
            return Err(ApiError::BadRequest(format!(
                "duree_projection must be at most {MAX_HORIZON_YEARS} years, got {horizon_years}"
            )));
        }

        let interest_per_year = match (self.interets_annuels, self.taux_emprunt) {
            (Some(interest), _) => {
                for value in &interest {
                    non_negative(*value, "interets_annuels")?;
                }
                interest
            }
            (None, Some(annual_rate)) => {
                let duration_years = self.duree_emprunt.ok_or_else(|| {
                    ApiError::BadRequest("duree_emprunt is required with taux_emprunt".to_string())
                })?;
                if duration_years > MAX_HORIZON_YEARS {
                    return Err(ApiError::BadRequest(format!(
                        "duree_emprunt must be at most {MAX_HORIZON_YEARS} years, \
                         got {duration_years}"
                    )));
                }
                LoanSchedule {
                    principal: loan_amount,
                    annual_rate: fraction(annual_rate, "taux_emprunt")?,
                    duration_years,
                }
                .yearly_interest()?
            }
            (None, None) => Vec::new(),
        };

        let flat_tax_rate = match (self.taux_imposition, self.revenu_imposable) {
            (Some(rate), _) => fraction(rate, "taux_imposition")?,
            (None, Some(income)) => {
                let shares = self.parts_quotient_familial.unwrap_or(Decimal::ONE);
                let marginal = ProgressiveTaxCalculator::new(&config.brackets)?
                    .marginal_rate(non_negative(income, "revenu_imposable")?, shares)?;
                (marginal + config.social_levy_rate).min(Decimal::ONE)
            }
            (None, None) => {
                return Err(ApiError::BadRequest(
                    "taux_imposition or revenu_imposable is required".to_string(),
                ));
            }
        };

        let start_year = self
            .annee_debut
            .or_else(|| self.date_achat.map(|date| date.year()))
            .unwrap_or(current_year);
        if !START_YEARS.contains(&start_year) {
            return Err(ApiError::BadRequest(format!(
                "annee_debut must be between {} and {}, got {start_year}",
                START_YEARS.start(),
                START_YEARS.end()
            )));
        }

        Ok(ProjectionInput {
            purchase_price,
            loan_amount,
            acquisition_costs,
            annual_rent,
            annual_charges,
            interest_per_year,
            horizon_years,
            flat_tax_rate,
            start_year,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRowResponse {
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_rent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub charges: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_result: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cashflow: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_cashflow: Decimal,
}

impl From<&YearlyProjectionRow> for YearRowResponse {
    fn from(row: &YearlyProjectionRow) -> Self {
        Self {
            year: row.year,
            gross_rent: row.gross_rent,
            charges: row.charges,
            interest: row.interest,
            net_result: row.net_result,
            tax: row.tax,
            cashflow: row.cashflow,
            cumulative_cashflow: row.cumulative_cashflow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionResponse {
    pub start_year: i32,
    pub horizon_years: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub flat_tax_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub down_payment: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_outlay: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_yield: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_yield: Decimal,
    pub break_even_year: Option<i32>,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_cumulative_cashflow: Decimal,
    pub rows: Vec<YearRowResponse>,
}

impl ProjectionResponse {
    pub fn new(
        input: &ProjectionInput,
        result: &ProjectionResult,
    ) -> Self {
        Self {
            start_year: input.start_year,
            horizon_years: input.horizon_years,
            flat_tax_rate: input.flat_tax_rate,
            down_payment: result.down_payment,
            initial_outlay: result.initial_outlay,
            gross_yield: result.gross_yield,
            net_yield: result.net_yield,
            break_even_year: result.break_even_year,
            final_cumulative_cashflow: result.final_cumulative_cashflow,
            rows: result.rows.iter().map(YearRowResponse::from).collect(),
        }
    }
}
