//! Implements an in-memory ledger store.
//!
//! Nothing is persisted, all transactions are lost when the process exits.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        LedgerStore, NewTransaction, Replaced, Transaction, TransactionFilter, TransactionPatch,
    },
};

#[derive(Debug, Default)]
struct Ledger {
    last_id: TransactionId,
    transactions: BTreeMap<TransactionId, Transaction>,
}

/// Stores transactions in process memory.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    ledger: Mutex<Ledger>,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self) -> Result<MutexGuard<'_, Ledger>, Error> {
        self.ledger
            .lock()
            .map_err(|_| Error::StoreFailure("the in-memory ledger lock is poisoned".to_owned()))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let mut ledger = self.ledger()?;

        ledger.last_id += 1;
        let transaction = transaction.into_transaction(ledger.last_id, OffsetDateTime::now_utc());
        ledger
            .transactions
            .insert(transaction.id, transaction.clone());

        Ok(transaction)
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.ledger()?
            .transactions
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn replace(&self, id: TransactionId, patch: &TransactionPatch) -> Result<Replaced, Error> {
        let mut ledger = self.ledger()?;
        let stored = ledger.transactions.get_mut(&id).ok_or(Error::NotFound)?;

        let previous = stored.clone();
        *stored = patch.apply_to(&previous);

        Ok(Replaced {
            previous,
            current: stored.clone(),
        })
    }

    fn remove(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.ledger()?
            .transactions
            .remove(&id)
            .ok_or(Error::NotFound)
    }

    fn list_all(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, Error> {
        let ledger = self.ledger()?;

        let mut transactions: Vec<Transaction> = ledger
            .transactions
            .values()
            .filter(|transaction| filter.matches(transaction))
            .cloned()
            .collect();

        transactions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        if let Some(limit) = filter.limit {
            transactions.truncate(limit);
        }

        Ok(transactions)
    }
}
