//! Rental income tax and profitability calculations.
//!
//! Leaves first: [`progressive`] and [`regime`] have no dependencies,
//! [`simulator`] combines them for a single fiscal year, and [`projection`]
//! runs the multi-year cashflow table on a flat effective rate.

pub mod common;
mod error;
pub mod loan;
pub mod progressive;
pub mod projection;
pub mod regime;
pub mod simulator;

pub use error::{MAX_AMOUNT, TaxCalculationError};
pub(crate) use error::{ensure_amount, ensure_rate};
pub use loan::{LoanSchedule, LoanScheduleError};
pub use progressive::ProgressiveTaxCalculator;
pub use projection::ProfitabilityProjector;
pub use regime::RentalRegimeResolver;
pub use simulator::TaxSimulator;
