//! SQLite storage for fiscal year configurations and rental transactions.

mod decimal;
mod factory;
mod repository;

pub use factory::{SqliteRepositoryFactory, seeds_dir};
pub use repository::SqliteRepository;
