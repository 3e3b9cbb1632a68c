//! HTTP routes.
//!
//! | method | path                             | body / query                |
//! |--------|----------------------------------|-----------------------------|
//! | POST   | `/api/tax/simulate`              | [`SimulatePayload`]         |
//! | GET    | `/api/tax/config`                | `?year=2024` (optional)     |
//! | POST   | `/api/profitability/projection`  | [`ProjectionPayload`]       |
//!
//! Every response, errors included, is JSON with `Cache-Control: no-store`.

use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use chrono::{Datelike, Utc};
use rental_core::autofill;
use rental_core::calculations::{ProfitabilityProjector, TaxSimulator};
use tracing::debug;

use crate::error::{ApiError, ErrorResponse, json_response};
use crate::state::AppState;
use crate::wire::{
    ConfigQuery, ConfigResponse, ProjectionPayload, ProjectionResponse, SimulatePayload,
    SimulateRequest, SimulationResponse,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tax/simulate", post(simulate_handler))
        .route("/api/tax/config", get(tax_config_handler))
        .route("/api/profitability/projection", post(projection_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn not_found_handler() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        ErrorResponse {
            error: "Not found".to_string(),
        },
    )
}

async fn simulate_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let SimulateRequest {
        input,
        year,
        user_id,
    } = payload.into_request()?;

    let year = year.unwrap_or(state.default_year);
    let config = state
        .fiscal_year(year)
        .ok_or_else(|| ApiError::BadRequest(format!("no fiscal configuration for {year}")))?;

    let input = match user_id.as_deref() {
        Some(user_id) => {
            autofill::resolve_input(state.repository.as_ref(), user_id, year, input).await?
        }
        None => input,
    };

    let result = TaxSimulator::new(config)?.simulate(&input)?;
    Ok(json_response(
        StatusCode::OK,
        SimulationResponse::new(year, input.auto_fill, &result),
    ))
}

async fn tax_config_handler(
    State(state): State<AppState>,
    query: Result<Query<ConfigQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let year = query.year.unwrap_or(state.default_year);

    let config = state
        .fiscal_year(year)
        .ok_or_else(|| ApiError::NotFound(format!("no fiscal configuration for {year}")))?;

    Ok(json_response(StatusCode::OK, ConfigResponse::from(config)))
}

async fn projection_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProjectionPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    // Only consulted when the flat rate has to be derived.
    let config = state.fiscal_year(state.default_year).ok_or_else(|| {
        ApiError::Internal(format!(
            "default fiscal year {} is not loaded",
            state.default_year
        ))
    })?;
    let input = payload.into_input(config, Utc::now().year())?;
    debug!(
        horizon = input.horizon_years,
        flat_tax_rate = %input.flat_tax_rate,
        "projection request"
    );

    let result = ProfitabilityProjector::project(&input)?;
    Ok(json_response(
        StatusCode::OK,
        ProjectionResponse::new(&input, &result),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Uri;
    use axum::response::IntoResponse;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rental_core::db::{DbConfig, RepositoryFactory};
    use rental_core::{NewRentalTransaction, TransactionKind};
    use rental_db_sqlite::SqliteRepositoryFactory;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use super::*;

    async fn seeded_state() -> AppState {
        let repo = SqliteRepositoryFactory
            .create(&DbConfig::new("sqlite", ":memory:"))
            .await
            .expect("Failed to create repository");
        AppState::load(Arc::from(repo), 2024)
            .await
            .expect("Failed to load state")
    }

    async fn record(
        state: &AppState,
        kind: TransactionKind,
        date: (i32, u32, u32),
        amount: rust_decimal::Decimal,
    ) {
        state
            .repository
            .insert_transaction(NewRentalTransaction {
                user_id: "alice".to_string(),
                property_id: Some(1),
                transaction_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                kind,
                amount,
                label: String::new(),
            })
            .await
            .expect("Failed to insert transaction");
    }

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    const EPS: f64 = 1e-6;

    fn assert_amount(
        actual: &Value,
        expected: f64,
    ) {
        let actual = actual.as_f64().unwrap();
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn into_response(result: Result<Response, ApiError>) -> Response {
        result.unwrap_or_else(IntoResponse::into_response)
    }

    async fn simulate(
        state: AppState,
        body: &Value,
    ) -> (StatusCode, Value) {
        let payload = Json::from_bytes(body.to_string().as_bytes());
        body_json(into_response(simulate_handler(State(state), payload).await)).await
    }

    async fn tax_config(
        state: AppState,
        uri: &str,
    ) -> (StatusCode, Value) {
        let uri: Uri = uri.parse().unwrap();
        let query = Query::try_from_uri(&uri);
        body_json(into_response(tax_config_handler(State(state), query).await)).await
    }

    async fn projection(
        state: AppState,
        body: &Value,
    ) -> (StatusCode, Value) {
        let payload = Json::from_bytes(body.to_string().as_bytes());
        body_json(into_response(projection_handler(State(state), payload).await)).await
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    #[tokio::test]
    async fn simulate_micro_foncier() {
        let state = seeded_state().await;
        let body = json!({
            "salaire_brut_annuel": 40000,
            "parts_quotient_familial": 1,
            "loyers_percus": 12000,
            "regime_fiscal": "micro_foncier"
        });

        let (status, json) = simulate(state, &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tax_year"], 2024);
        assert_eq!(json["regime"], "micro_foncier");
        assert_eq!(json["taxable_salary"], 36000.0);
        assert_eq!(json["net_rental_income"], 8400.0);
        assert_amount(&json["income_tax_without_rental"], 4086.23);
        assert_amount(&json["income_tax_with_rental"], 6606.23);
        assert_amount(&json["social_levy"], 1444.8);
        assert_amount(&json["tax_difference"], 3964.8);
        assert_amount(&json["net_rental_cashflow"], 8035.2);
    }

    #[tokio::test]
    async fn simulate_auto_fill_reads_recorded_transactions() {
        let state = seeded_state().await;
        record(&state, TransactionKind::Rent, (2024, 3, 1), dec!(12000)).await;
        record(&state, TransactionKind::DeductibleCharge, (2024, 6, 1), dec!(4000)).await;
        record(&state, TransactionKind::Rent, (2023, 12, 1), dec!(999)).await;
        let body = json!({
            "salaire_brut_annuel": 40000,
            "parts_quotient_familial": 1,
            "loyers_percus": 1,
            "regime_fiscal": "reel",
            "auto_fill": true,
            "user_id": "alice",
            "annee": 2024
        });

        let (status, json) = simulate(state, &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["auto_filled"], true);
        assert_eq!(json["gross_rent"], 12000.0);
        assert_eq!(json["net_rental_income"], 8000.0);
        assert_amount(&json["income_tax_with_rental"], 6486.23);
        assert_eq!(json["net_rental_cashflow"], 4224.0);
    }

    #[tokio::test]
    async fn simulate_uses_requested_year() {
        let state = seeded_state().await;
        let body = json!({
            "salaire_brut_annuel": 40000,
            "parts_quotient_familial": 1,
            "annee": 2025
        });

        let (status, json) = simulate(state, &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tax_year"], 2025);
    }

    #[tokio::test]
    async fn simulate_unknown_year_is_bad_request() {
        let state = seeded_state().await;
        let body = json!({
            "salaire_brut_annuel": 40000,
            "parts_quotient_familial": 1,
            "annee": 1999
        });

        let (status, json) = simulate(state, &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "error": "no fiscal configuration for 1999" }));
    }

    #[tokio::test]
    async fn simulate_rejects_fractional_shares_below_one() {
        let state = seeded_state().await;
        let body = json!({ "salaire_brut_annuel": 40000, "parts_quotient_familial": 0.5 });

        let (status, json) = simulate(state, &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({ "error": "family quotient shares must be at least 1, got 0.5" })
        );
    }

    #[tokio::test]
    async fn simulate_rejects_amounts_too_large_to_compute() {
        let state = seeded_state().await;
        let body = json!({
            "salaire_brut_annuel": "70000000000000000000000000000",
            "parts_quotient_familial": 1,
            "loyers_percus": "70000000000000000000000000000",
            "autres_revenus": "70000000000000000000000000000"
        });

        let (status, json) = simulate(state, &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({
                "error": "gross_salary must be at most 1000000000000000, \
                          got 70000000000000000000000000000"
            })
        );
    }

    #[tokio::test]
    async fn simulate_rejects_malformed_json() {
        let state = seeded_state().await;
        let payload = Json::<SimulatePayload>::from_bytes(b"{ not json");

        let response = into_response(simulate_handler(State(state), payload).await);
        let (status, json) = body_json(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    #[tokio::test]
    async fn config_defaults_to_configured_year() {
        let state = seeded_state().await;

        let (status, json) = tax_config(state, "/api/tax/config").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tax_year"], 2024);
        assert_eq!(json["tax_brackets"].as_array().unwrap().len(), 5);
        assert_eq!(json["social_security_rate"], 0.172);
    }

    #[tokio::test]
    async fn config_for_another_year() {
        let state = seeded_state().await;

        let (status, json) = tax_config(state, "/api/tax/config?year=2025").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tax_brackets"][1]["lower_bound"], 11497.0);
    }

    #[tokio::test]
    async fn config_unknown_year_is_not_found() {
        let state = seeded_state().await;

        let (status, json) = tax_config(state, "/api/tax/config?year=1999").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "error": "no fiscal configuration for 1999" }));
    }

    // ========================================================================
    // Projection
    // ========================================================================

    #[tokio::test]
    async fn projection_with_explicit_interest() {
        let state = seeded_state().await;
        let body = json!({
            "prix_achat": 200000,
            "montant_emprunt": 180000,
            "frais_acquisition": 15000,
            "loyer_annuel": 12000,
            "charges_annuelles": 3600,
            "taux_imposition": 0.30,
            "duree_projection": 2,
            "interets_annuels": [7000, 6800],
            "annee_debut": 2024
        });

        let (status, json) = projection(state, &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["down_payment"], 20000.0);
        assert_eq!(json["initial_outlay"], 35000.0);
        assert_eq!(json["break_even_year"], Value::Null);
        assert_eq!(
            json["rows"][1],
            json!({
                "year": 2025,
                "gross_rent": 12000.0,
                "charges": 3600.0,
                "interest": 6800.0,
                "net_result": 1600.0,
                "tax": 480.0,
                "cashflow": 1120.0,
                "cumulative_cashflow": -32900.0
            })
        );
        assert_eq!(json["final_cumulative_cashflow"], -32900.0);
    }

    #[tokio::test]
    async fn projection_without_rate_is_bad_request() {
        let state = seeded_state().await;
        let body = json!({ "prix_achat": 200000, "loyer_annuel": 12000 });

        let (status, json) = projection(state, &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({ "error": "taux_imposition or revenu_imposable is required" })
        );
    }

    #[tokio::test]
    async fn projection_rejects_start_year_at_the_integer_limit() {
        let state = seeded_state().await;
        let body = json!({
            "prix_achat": 200000,
            "loyer_annuel": 12000,
            "taux_imposition": 0.30,
            "duree_projection": 1,
            "annee_debut": i32::MAX
        });

        let (status, json) = projection(state, &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("annee_debut must be between"));
    }

    // ========================================================================
    // Fallback
    // ========================================================================

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let (status, json) = body_json(not_found_handler().await).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "error": "Not found" }));
    }
}
