use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::{JsonRejection, PathRejection}},
};

use crate::{
    AppState, Error, TransactionCoordinator,
    database_id::TransactionId,
    transaction::{Transaction, TransactionPayload, create_endpoint::json_rejection_to_error},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// Updates the transaction and moves capital by the net change.
    pub coordinator: TransactionCoordinator,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            coordinator: state.coordinator.clone(),
        }
    }
}

/// A route handler for partially updating a transaction, responds with the updated record.
///
/// A path that does not hold an integer ID cannot name a transaction, so it
/// gets the same response as an unknown ID.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Path(transaction_id) = transaction_id.map_err(|_| Error::NotFound)?;
    let Json(payload) = payload.map_err(json_rejection_to_error)?;
    let patch = payload.into_patch()?;

    state.coordinator.update(transaction_id, patch).map(Json)
}
