//! Route handlers for reading and reconciling capital.

use axum::{
    Json,
    extract::{FromRef, State},
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{AppState, Error, TransactionCoordinator, capital::Reconciliation};

/// The state needed to read or reconcile capital.
#[derive(Debug, Clone)]
pub struct CapitalState {
    /// Owns the ledger and the capital value.
    pub coordinator: TransactionCoordinator,
}

impl FromRef<AppState> for CapitalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            coordinator: state.coordinator.clone(),
        }
    }
}

/// The response body for [get_capital_endpoint].
#[derive(Debug, Serialize, PartialEq)]
pub struct CapitalResponse {
    /// The current capital.
    #[serde(with = "rust_decimal::serde::float")]
    pub capital: Decimal,
}

/// A route handler that responds with the current capital.
pub async fn get_capital_endpoint(
    State(state): State<CapitalState>,
) -> Result<Json<CapitalResponse>, Error> {
    let capital = state.coordinator.capital()?;

    Ok(Json(CapitalResponse { capital }))
}

/// A route handler that recomputes capital from the ledger and responds with
/// the previous value, the new value and the drift between them.
pub async fn reconcile_capital_endpoint(
    State(state): State<CapitalState>,
) -> Result<Json<Reconciliation>, Error> {
    state.coordinator.reconcile().map(Json)
}
