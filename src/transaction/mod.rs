//! Transactions, the income and expense records held in the ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, validated `NewTransaction` and `TransactionPatch` inputs
//! - The `LedgerStore` trait with SQLite and in-memory implementations
//! - Route handlers for the transaction JSON API

mod amount;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod memory;
mod payload;
mod sqlite;
mod store;

pub use amount::{AMOUNT_SCALE, Amount, AmountError, MAX_AMOUNT_MINOR_UNITS};
pub use core::{NewTransaction, Replaced, Transaction, TransactionKind, TransactionPatch};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use memory::InMemoryLedgerStore;
pub use payload::TransactionPayload;
pub use sqlite::{SQLiteLedgerStore, create_transaction_table};
pub use store::{LedgerStore, TransactionFilter};
