//! Implements a struct that holds the state of the REST server.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{
    Error, TransactionCoordinator,
    capital::{BalanceKeeper, InMemoryBalanceKeeper, SQLiteBalanceKeeper},
    config::{Config, StorageBackend},
    db::initialize,
    transaction::{InMemoryLedgerStore, LedgerStore, SQLiteLedgerStore},
};

/// The default number of transactions returned by a list request.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Controls how lists of transactions are returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
    /// The number of transactions to return when the request gives no valid limit.
    pub default_limit: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Applies transaction writes and keeps capital consistent with them.
    pub coordinator: TransactionCoordinator,

    /// The config that controls how to list transactions.
    pub list_config: ListConfig,
}

impl AppState {
    /// Create a new [AppState] from an existing coordinator.
    pub fn new(coordinator: TransactionCoordinator, list_config: ListConfig) -> Self {
        Self {
            coordinator,
            list_config,
        }
    }

    /// Create a new [AppState] backed by a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// transactions and capital.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn with_sqlite(db_connection: Connection, list_config: ListConfig) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));
        let ledger: Arc<dyn LedgerStore> = Arc::new(SQLiteLedgerStore::new(connection.clone()));
        let balance: Arc<dyn BalanceKeeper> = Arc::new(SQLiteBalanceKeeper::new(connection));

        Ok(Self::new(
            TransactionCoordinator::new(ledger, balance),
            list_config,
        ))
    }

    /// Create a new [AppState] that keeps everything in memory.
    pub fn in_memory(list_config: ListConfig) -> Self {
        let ledger: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new());
        let balance: Arc<dyn BalanceKeeper> = Arc::new(InMemoryBalanceKeeper::new());

        Self::new(TransactionCoordinator::new(ledger, balance), list_config)
    }

    /// Create the [AppState] described by `config`.
    ///
    /// # Errors
    /// Returns an error if the SQLite database cannot be opened or initialized.
    /// There is no fallback to in-memory storage.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let list_config = ListConfig {
            default_limit: config.list_limit as usize,
        };

        match config.storage {
            StorageBackend::Sqlite => {
                let connection = open_database(&config.db_path)?;
                tracing::info!("using SQLite database at {}", config.db_path.display());
                Self::with_sqlite(connection, list_config)
            }
            StorageBackend::Memory => {
                tracing::warn!(
                    "using in-memory storage, transactions and capital will be lost when the server stops"
                );
                Ok(Self::in_memory(list_config))
            }
        }
    }
}

fn open_database(path: &Path) -> Result<Connection, Error> {
    Connection::open(path).map_err(|error| {
        tracing::error!("could not open database at {}: {error}", path.display());
        Error::StoreFailure(format!(
            "could not open database at {}: {error}",
            path.display()
        ))
    })
}
