//! Implements a SQLite backed ledger store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, params, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        LedgerStore, NewTransaction, Replaced, Transaction, TransactionFilter, TransactionPatch,
    },
};

const SELECT_COLUMNS: &str = "id, kind, amount, description, date, created_at";

/// Stores transactions in a SQLite database.
///
/// The connection may be shared with a [SQLiteBalanceKeeper](crate::SQLiteBalanceKeeper),
/// the mutex then serializes all database access for the process.
#[derive(Debug, Clone)]
pub struct SQLiteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedgerStore {
    /// Create a new store for the SQLite `connection`.
    ///
    /// The tables must already exist, see [initialize_db](crate::initialize_db).
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::StoreFailure("could not acquire the database lock".to_owned())
        })
    }
}

impl LedgerStore for SQLiteLedgerStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return an [Error::StoreFailure] if there is an SQL error.
    fn insert(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let created_at = OffsetDateTime::now_utc();

        let transaction = self
            .connection()?
            .prepare(&format!(
                "INSERT INTO \"transaction\" (kind, amount, description, date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {SELECT_COLUMNS}"
            ))?
            .query_row(
                params![
                    transaction.kind,
                    transaction.amount,
                    transaction.description,
                    transaction.date,
                    created_at,
                ],
                map_transaction_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve a transaction from the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::StoreFailure] there is some other SQL error.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        let transaction = self
            .connection()?
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM \"transaction\" WHERE id = :id"
            ))?
            .query_row(&[(":id", &id)], map_transaction_row)?;

        Ok(transaction)
    }

    /// Update the transaction `id` inside a single SQL transaction.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::StoreFailure] there is some other SQL error.
    fn replace(&self, id: TransactionId, patch: &TransactionPatch) -> Result<Replaced, Error> {
        let connection = self.connection()?;
        let tx = connection.unchecked_transaction()?;

        let previous = tx
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM \"transaction\" WHERE id = :id"
            ))?
            .query_row(&[(":id", &id)], map_transaction_row)?;

        let current = patch.apply_to(&previous);

        tx.execute(
            "UPDATE \"transaction\" \
            SET \
                kind = ?1, \
                amount = ?2, \
                description = ?3, \
                date = ?4 \
            WHERE id = ?5",
            params![
                current.kind,
                current.amount,
                current.description,
                current.date,
                id,
            ],
        )?;

        tx.commit()?;

        Ok(Replaced { previous, current })
    }

    /// Delete the transaction `id` and return the deleted row.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::StoreFailure] there is some other SQL error.
    fn remove(&self, id: TransactionId) -> Result<Transaction, Error> {
        let transaction = self
            .connection()?
            .prepare(&format!(
                "DELETE FROM \"transaction\" WHERE id = :id RETURNING {SELECT_COLUMNS}"
            ))?
            .query_row(&[(":id", &id)], map_transaction_row)?;

        Ok(transaction)
    }

    /// Query for transactions in the database, newest first.
    ///
    /// The kind filter, ordering and limit run in SQL. A search is matched
    /// with [TransactionFilter::matches] instead, since SQLite's `lower` only
    /// folds ASCII.
    ///
    /// # Errors
    /// This function will return a [Error::StoreFailure] there is a SQL error.
    fn list_all(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, Error> {
        let mut query_string_parts = vec![format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\""
        )];
        let mut query_parameters = vec![];

        if let Some(kind) = filter.kind {
            query_string_parts.push(format!("WHERE kind = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(kind.as_str().to_owned()));
        }

        // Sort by creation time, and then ID to keep the order stable for equal timestamps
        query_string_parts.push("ORDER BY created_at DESC, id DESC".to_owned());

        let search = filter.search_text();

        if let (None, Some(limit)) = (search, filter.limit) {
            query_string_parts.push(format!("LIMIT ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Integer(
                i64::try_from(limit).unwrap_or(i64::MAX),
            ));
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        let mut transactions = self
            .connection()?
            .prepare(&query_string)?
            .query_map(params, map_transaction_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if search.is_some() {
            transactions.retain(|transaction| filter.matches(transaction));

            if let Some(limit) = filter.limit {
                transactions.truncate(limit);
            }
        }

        Ok(transactions)
    }
}

/// Create the transaction table in the database.
///
/// Amounts are stored in minor units (e.g. cents).
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                amount INTEGER NOT NULL CHECK (amount >= 0),
                description TEXT,
                date TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_created_at ON \"transaction\"(created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let kind = row.get(1)?;
    let amount = row.get(2)?;
    let description = row.get(3)?;
    let date = row.get(4)?;
    let created_at = row.get(5)?;

    Ok(Transaction {
        id,
        kind,
        amount,
        description,
        date,
        created_at,
    })
}
