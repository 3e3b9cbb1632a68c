//! HTTP API for the rental tax simulator and profitability projection.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod wire;

pub use config::{ConfigError, ConfigOverrides, ServerConfig};
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, StartupError};
