//! CSV loaders for fiscal schedules and rental transactions.

mod loader;

pub use loader::{
    BracketRecord, FiscalLoaderError, FiscalScheduleLoader, ParameterRecord, TransactionLoader,
    TransactionRecord,
};
