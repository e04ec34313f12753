//! Orchestrates transaction writes so that capital always follows the ledger.
//!
//! Every write goes to the ledger store first and then to the balance keeper.
//! If the balance step fails after the ledger write succeeded, the ledger
//! keeps the change and capital is left missing that delta. That state is
//! logged, reported to the caller and repaired by [TransactionCoordinator::reconcile].

use std::{
    fmt::Debug,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use rust_decimal::Decimal;

use crate::{
    Error,
    capital::{BalanceKeeper, Reconciliation, ledger_total, to_decimal},
    database_id::TransactionId,
    transaction::{LedgerStore, NewTransaction, Transaction, TransactionFilter, TransactionPatch},
};

/// Applies create, update and delete requests to the ledger store and keeps
/// the balance keeper consistent with it.
///
/// The coordinator holds no state of its own between requests, it is cheap to
/// clone and share between handlers.
#[derive(Clone)]
pub struct TransactionCoordinator {
    ledger: Arc<dyn LedgerStore>,
    balance: Arc<dyn BalanceKeeper>,
    /// Writes hold a shared guard from the ledger write until the balance
    /// update, reconciliation holds the exclusive guard so it never sees a
    /// half-applied write from this process.
    write_gate: Arc<RwLock<()>>,
}

impl Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .finish_non_exhaustive()
    }
}

impl TransactionCoordinator {
    /// Create a coordinator for the given ledger store and balance keeper.
    pub fn new(ledger: Arc<dyn LedgerStore>, balance: Arc<dyn BalanceKeeper>) -> Self {
        Self {
            ledger,
            balance,
            write_gate: Arc::new(RwLock::new(())),
        }
    }

    // The gate guards no data, so a panic while holding it leaves nothing to clean up.
    fn write_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.write_gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn exclusive_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.write_gate
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new transaction and add it to capital.
    ///
    /// # Errors
    /// Returns an [Error::StoreFailure] if either store fails. If the ledger
    /// write succeeded, the transaction stays recorded even though an error is
    /// returned.
    pub fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let _guard = self.write_guard();

        let transaction = self.ledger.insert(transaction)?;
        tracing::debug!(
            "created {} transaction {} of {}",
            transaction.kind,
            transaction.id,
            transaction.amount
        );

        self.balance
            .apply_delta(transaction.kind, transaction.amount, false)
            .map_err(|error| log_drift("create", transaction.id, error))?;

        Ok(transaction)
    }

    /// Apply `patch` to the transaction `id` and move capital by the net change.
    ///
    /// The before and after values come from the ledger store's own atomic
    /// snapshot, so concurrent updates of the same transaction each reconcile
    /// exactly the change they made.
    ///
    /// An empty patch writes nothing and returns the stored transaction.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if the transaction does not exist (capital
    /// is untouched), or an [Error::StoreFailure] if either store fails.
    pub fn update(&self, id: TransactionId, patch: TransactionPatch) -> Result<Transaction, Error> {
        if patch.is_empty() {
            return self.ledger.get(id);
        }

        let _guard = self.write_guard();

        let replaced = self.ledger.replace(id, &patch)?;
        let (previous, current) = (&replaced.previous, &replaced.current);
        tracing::debug!(
            "updated transaction {id} from {} {} to {} {}",
            previous.kind,
            previous.amount,
            current.kind,
            current.amount
        );

        self.balance
            .reconcile_edit(previous.kind, previous.amount, current.kind, current.amount)
            .map_err(|error| log_drift("update", id, error))?;

        Ok(replaced.current)
    }

    /// Remove the transaction `id` and take it back out of capital.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if the transaction does not exist (capital
    /// is untouched), or an [Error::StoreFailure] if either store fails.
    pub fn delete(&self, id: TransactionId) -> Result<(), Error> {
        let _guard = self.write_guard();

        let removed = self.ledger.remove(id)?;
        tracing::debug!(
            "deleted {} transaction {id} of {}",
            removed.kind,
            removed.amount
        );

        self.balance
            .apply_delta(removed.kind, removed.amount, true)
            .map_err(|error| log_drift("delete", id, error))
    }

    /// Read transactions straight from the ledger store.
    ///
    /// # Errors
    /// Returns an [Error::StoreFailure] if the ledger cannot be read.
    pub fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, Error> {
        self.ledger.list_all(filter)
    }

    /// The current capital.
    ///
    /// # Errors
    /// Returns an [Error::StoreFailure] if the balance cannot be read.
    pub fn capital(&self) -> Result<Decimal, Error> {
        self.balance.get()
    }

    /// Overwrite capital with the signed sum of the ledger.
    ///
    /// Waits for in-flight writes from this process to finish first.
    ///
    /// # Errors
    /// Returns an [Error::StoreFailure] if either store fails.
    pub fn reconcile(&self) -> Result<Reconciliation, Error> {
        let _guard = self.exclusive_guard();

        let previous = self.balance.get()?;
        let capital = self.balance.recompute(self.ledger.as_ref())?;
        let reconciliation = Reconciliation::new(previous, capital);

        if reconciliation.has_drifted() {
            tracing::warn!(
                "capital drifted by {}, corrected from {previous} to {capital}",
                reconciliation.drift
            );
        } else {
            tracing::debug!("capital {capital} matches the ledger");
        }

        Ok(reconciliation)
    }

    /// Check that capital equals the signed sum of the ledger without changing anything.
    ///
    /// # Errors
    /// Returns an [Error::InconsistencyDrift] if they differ, or an
    /// [Error::StoreFailure] if either store fails.
    pub fn verify(&self) -> Result<Decimal, Error> {
        let _guard = self.exclusive_guard();

        let stored = self.balance.read()?;
        let expected = ledger_total(self.ledger.as_ref())?;

        if stored == expected {
            Ok(to_decimal(stored))
        } else {
            Err(Error::InconsistencyDrift {
                stored: to_decimal(stored),
                expected: to_decimal(expected),
            })
        }
    }
}

fn log_drift(operation: &str, id: TransactionId, error: Error) -> Error {
    tracing::error!(
        "{operation} of transaction {id} reached the ledger but capital was not updated, \
        capital will drift until the next reconciliation: {error}"
    );

    error
}
