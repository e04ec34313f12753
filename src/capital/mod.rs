//! Capital, the running net balance of every recorded transaction.
//!
//! This module contains:
//! - The `BalanceKeeper` trait with SQLite and in-memory implementations
//! - The reconciliation that repairs capital from the ledger
//! - Route handlers for reading and reconciling capital

mod core;
mod endpoint;
mod memory;
mod reconcile;
mod sqlite;

pub use core::{BalanceKeeper, ledger_total};
pub(crate) use core::to_decimal;
pub use endpoint::{get_capital_endpoint, reconcile_capital_endpoint};
pub use memory::InMemoryBalanceKeeper;
pub use reconcile::{Reconciliation, spawn_reconciliation_job};
pub use sqlite::{SQLiteBalanceKeeper, create_capital_table};
