//! Repairs capital drift by recomputing capital from the ledger.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::TransactionCoordinator;

/// The outcome of overwriting capital with the signed sum of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reconciliation {
    /// Capital before it was recomputed.
    #[serde(with = "rust_decimal::serde::float")]
    pub previous: Decimal,
    /// Capital after it was recomputed.
    #[serde(with = "rust_decimal::serde::float")]
    pub capital: Decimal,
    /// `capital - previous`, zero when nothing had drifted.
    #[serde(with = "rust_decimal::serde::float")]
    pub drift: Decimal,
}

impl Reconciliation {
    pub(crate) fn new(previous: Decimal, capital: Decimal) -> Self {
        Self {
            previous,
            capital,
            drift: capital - previous,
        }
    }

    /// Whether capital had to be corrected.
    pub fn has_drifted(&self) -> bool {
        !self.drift.is_zero()
    }
}

/// Spawn a task that reconciles capital every `period`.
///
/// The first reconciliation happens one `period` after the task starts.
/// Failures are logged and the task keeps running.
pub fn spawn_reconciliation_job(
    coordinator: TransactionCoordinator,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            let coordinator = coordinator.clone();
            match tokio::task::spawn_blocking(move || coordinator.reconcile()).await {
                Ok(Ok(reconciliation)) if reconciliation.has_drifted() => {
                    tracing::info!(
                        "periodic reconciliation corrected capital to {}",
                        reconciliation.capital
                    );
                }
                Ok(Ok(_)) => {}
                Ok(Err(error)) => tracing::error!("periodic reconciliation failed: {error}"),
                Err(error) => tracing::error!("periodic reconciliation task panicked: {error}"),
            }
        }
    })
}
