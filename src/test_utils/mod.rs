#![allow(missing_docs)]

mod balance;

use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState, ListConfig, TransactionCoordinator, build_router,
    capital::{InMemoryBalanceKeeper, SQLiteBalanceKeeper},
    db::initialize,
    transaction::{Amount, InMemoryLedgerStore, NewTransaction, SQLiteLedgerStore, TransactionKind},
};

pub(crate) use balance::FailingBalanceKeeper;

#[track_caller]
pub(crate) fn amount(minor_units: i64) -> Amount {
    Amount::from_minor_units(minor_units).expect("invalid test amount")
}

pub(crate) fn income(minor_units: i64) -> NewTransaction {
    NewTransaction::new(TransactionKind::Income, amount(minor_units))
}

pub(crate) fn expense(minor_units: i64) -> NewTransaction {
    NewTransaction::new(TransactionKind::Expense, amount(minor_units))
}

pub(crate) fn memory_coordinator() -> TransactionCoordinator {
    TransactionCoordinator::new(
        Arc::new(InMemoryLedgerStore::new()),
        Arc::new(InMemoryBalanceKeeper::new()),
    )
}

pub(crate) fn sqlite_coordinator() -> TransactionCoordinator {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");
    let connection = Arc::new(Mutex::new(connection));

    TransactionCoordinator::new(
        Arc::new(SQLiteLedgerStore::new(connection.clone())),
        Arc::new(SQLiteBalanceKeeper::new(connection)),
    )
}

/// One coordinator per storage backend, so a test can check both.
pub(crate) fn all_coordinators() -> [TransactionCoordinator; 2] {
    [memory_coordinator(), sqlite_coordinator()]
}

/// A coordinator whose balance keeper can be told to fail.
pub(crate) fn failing_coordinator() -> (TransactionCoordinator, Arc<FailingBalanceKeeper>) {
    let balance = Arc::new(FailingBalanceKeeper::default());
    let coordinator =
        TransactionCoordinator::new(Arc::new(InMemoryLedgerStore::new()), balance.clone());

    (coordinator, balance)
}

pub(crate) fn memory_app() -> AppState {
    AppState::new(memory_coordinator(), ListConfig::default())
}

pub(crate) fn sqlite_app() -> AppState {
    AppState::new(sqlite_coordinator(), ListConfig::default())
}

pub(crate) fn failing_app() -> (AppState, Arc<FailingBalanceKeeper>) {
    let (coordinator, balance) = failing_coordinator();

    (AppState::new(coordinator, ListConfig::default()), balance)
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state))
}
