pub mod autofill;
pub mod calculations;
pub mod db;
pub mod models;

pub use db::repository::{RentalRepository, RepositoryError};
pub use models::*;
