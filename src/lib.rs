//! Capital Ledger records income and expense transactions and keeps a running
//! capital total that always equals the signed sum of those transactions.
//!
//! This library provides a small JSON REST API and a dashboard page on top of
//! a pluggable ledger store and balance keeper.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod capital;
mod config;
mod coordinator;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod logging;
mod not_found;
mod routing;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, ListConfig};
pub use capital::{
    BalanceKeeper, InMemoryBalanceKeeper, Reconciliation, SQLiteBalanceKeeper,
    spawn_reconciliation_job,
};
pub use config::{Config, StorageBackend};
pub use coordinator::TransactionCoordinator;
pub use database_id::TransactionId;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    Amount, InMemoryLedgerStore, LedgerStore, NewTransaction, Replaced, SQLiteLedgerStore,
    Transaction, TransactionFilter, TransactionKind, TransactionPatch,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not describe a valid transaction.
    ///
    /// Holds every violated rule, not just the first one found, so the client
    /// can fix the whole request in one go.
    #[error("invalid input: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    /// The requested transaction does not exist.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested transaction could not be found")]
    NotFound,

    /// The underlying persistence layer errored or is unavailable.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the client this error is replaced with an
    /// opaque internal server error.
    #[error("the store failed: {0}")]
    StoreFailure(String),

    /// The stored capital no longer equals the signed sum of the ledger.
    ///
    /// Normal operations never return this error, it is only produced by
    /// explicit consistency checks.
    #[error("capital has drifted: stored {stored}, ledger sum {expected}")]
    InconsistencyDrift {
        /// The capital value currently held by the balance keeper.
        stored: Decimal,
        /// The capital value recomputed from the ledger.
        expected: Decimal,
    },
}

impl Error {
    /// A single invalid input message.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(vec![message.into()])
    }

    /// The machine-readable error kind sent to clients.
    fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound => "not_found",
            Error::StoreFailure(_) | Error::InconsistencyDrift { .. } => "internal_error",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::StoreFailure(error.to_string())
            }
        }
    }
}

/// The JSON body sent with every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let kind = self.kind();

        match self {
            Error::InvalidInput(details) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: kind,
                    details,
                }),
            )
                .into_response(),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    error: kind,
                    details: vec!["The transaction could not be found.".to_owned()],
                }),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: kind,
                        details: Vec::new(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    use crate::Error;

    async fn body_json(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("could not read body");

        (
            status,
            serde_json::from_slice(&body).expect("body is not JSON"),
        )
    }

    #[tokio::test]
    async fn invalid_input_lists_every_detail() {
        let (status, body) = body_json(Error::InvalidInput(vec![
            "type is required".to_owned(),
            "amount must not be negative".to_owned(),
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "error": "invalid_input",
                "details": ["type is required", "amount must not be negative"]
            })
        );
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = body_json(Error::NotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn store_failure_does_not_leak_details() {
        let (status, body) =
            body_json(Error::StoreFailure("disk I/O error at /var/db".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "internal_error" }));
    }

    #[tokio::test]
    async fn drift_is_opaque() {
        let (status, body) = body_json(Error::InconsistencyDrift {
            stored: Decimal::ONE,
            expected: Decimal::TWO,
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "internal_error" }));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
