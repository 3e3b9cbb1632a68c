mod fiscal_year_config;
mod projection;
mod rental_regime;
mod rental_transaction;
mod simulation;
mod tax_bracket;

pub use fiscal_year_config::{FiscalConfigError, FiscalYearConfig, validate_brackets};
pub use projection::{ProjectionInput, ProjectionResult, YearlyProjectionRow};
pub use rental_regime::RentalRegime;
pub use rental_transaction::{NewRentalTransaction, RentalTotals, RentalTransaction, TransactionKind};
pub use simulation::{TaxCalculationResult, TaxSimulationInput};
pub use tax_bracket::TaxBracket;
