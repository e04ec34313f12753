use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};

use crate::{
    AppState, Error, TransactionCoordinator,
    transaction::{Transaction, TransactionPayload},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// Records the transaction and updates capital.
    pub coordinator: TransactionCoordinator,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            coordinator: state.coordinator.clone(),
        }
    }
}

/// A route handler for creating a new transaction, responds with the stored record.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(payload) = payload.map_err(json_rejection_to_error)?;
    let new_transaction = payload.into_new_transaction()?;

    state.coordinator.create(new_transaction).map(Json)
}

/// Malformed JSON is a client error like any other invalid input.
pub(crate) fn json_rejection_to_error(rejection: JsonRejection) -> Error {
    tracing::debug!("rejected request body: {rejection}");
    Error::invalid(rejection.body_text())
}
