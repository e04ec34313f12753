use axum::{
    extract::{FromRef, Path, State, rejection::PathRejection},
    http::StatusCode,
};

use crate::{AppState, Error, TransactionCoordinator, database_id::TransactionId};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// Removes the transaction and takes it back out of capital.
    pub coordinator: TransactionCoordinator,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            coordinator: state.coordinator.clone(),
        }
    }
}

/// A route handler for deleting a transaction, responds with 204 No Content.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(transaction_id) = transaction_id.map_err(|_| Error::NotFound)?;

    state.coordinator.delete(transaction_id)?;

    Ok(StatusCode::NO_CONTENT)
}
