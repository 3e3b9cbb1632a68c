//! Pre-processing step that fills rental figures from recorded transactions.
//!
//! The calculators never touch storage. When a [`TaxSimulationInput`] asks
//! for auto-fill, the caller resolves the input here first and hands the
//! result to [`TaxSimulator`](crate::calculations::TaxSimulator).

use tracing::debug;

use crate::{RentalRepository, RentalTotals, RepositoryError, TaxSimulationInput};

/// Replaces gross rent and deductible charges with `totals`.
///
/// A no-op unless `input.auto_fill` is set.
pub fn apply_recorded_totals(
    mut input: TaxSimulationInput,
    totals: RentalTotals,
) -> TaxSimulationInput {
    if input.auto_fill {
        input.gross_rent = totals.gross_rent;
        input.deductible_charges = totals.deductible_charges;
    }
    input
}

/// Fetches `user_id`'s totals for `fiscal_year` when auto-fill is requested.
///
/// # Errors
///
/// Propagates repository failures. Missing records are not an error; the
/// repository reports them as zero totals.
pub async fn resolve_input(
    repo: &dyn RentalRepository,
    user_id: &str,
    fiscal_year: i32,
    input: TaxSimulationInput,
) -> Result<TaxSimulationInput, RepositoryError> {
    if !input.auto_fill {
        return Ok(input);
    }

    let totals = repo.rental_totals(user_id, fiscal_year).await?;
    debug!(
        user_id,
        fiscal_year,
        gross_rent = %totals.gross_rent,
        deductible_charges = %totals.deductible_charges,
        "auto-filled rental figures"
    );
    Ok(apply_recorded_totals(input, totals))
}
