use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use rental_core::calculations::{LoanScheduleError, TaxCalculationError};
use rental_core::{FiscalConfigError, RepositoryError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input problem; the message is returned as-is.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Logged with its details, reported to the caller as "internal error".
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TaxCalculationError> for ApiError {
    fn from(err: TaxCalculationError) -> Self {
        match err {
            TaxCalculationError::Configuration(inner) => Self::from(inner),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<LoanScheduleError> for ApiError {
    fn from(err: LoanScheduleError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

// Configurations are validated at start-up, so reaching this is a server bug.
impl From<FiscalConfigError> for ApiError {
    fn from(err: FiscalConfigError) -> Self {
        Self::Internal(format!("fiscal configuration: {err}"))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self::Internal(format!("repository: {err}"))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Internal(detail) => {
                error!(%detail, "request failed");
                "internal error".to_string()
            }
            Self::BadRequest(msg) | Self::NotFound(msg) => msg,
        };
        json_response(status, ErrorResponse { error: message })
    }
}

pub fn json_response<T: Serialize>(
    status: StatusCode,
    body: T,
) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}
