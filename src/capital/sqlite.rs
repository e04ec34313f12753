//! Implements a SQLite backed balance keeper.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, params};
use time::OffsetDateTime;

use crate::{
    Error,
    capital::{BalanceKeeper, core::capital_overflow},
};

/// Keeps capital in a single-row SQLite table.
///
/// Every change is a single `INSERT ... ON CONFLICT DO UPDATE` statement that
/// adds to the stored value, so the increment is atomic in the database even
/// when another process shares the file. SQLite turns an overflowing integer
/// sum into a REAL, so the update only applies while the sum stays an integer.
#[derive(Debug, Clone)]
pub struct SQLiteBalanceKeeper {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteBalanceKeeper {
    /// Create a new balance keeper for the SQLite `connection`.
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

impl BalanceKeeper for SQLiteBalanceKeeper {
    fn read(&self) -> Result<i64, Error> {
        let connection = self.connection()?;

        connection.execute(
            "INSERT OR IGNORE INTO capital (id, value, updated_at) VALUES (1, 0, ?1)",
            params![OffsetDateTime::now_utc()],
        )?;

        let value = connection.query_row("SELECT value FROM capital WHERE id = 1", [], |row| {
            row.get(0)
        })?;

        Ok(value)
    }

    fn increment(&self, delta: i64) -> Result<(), Error> {
        let rows_changed = self.connection()?.execute(
            "INSERT INTO capital (id, value, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                value = capital.value + excluded.value,
                updated_at = excluded.updated_at
             WHERE typeof(capital.value + excluded.value) = 'integer'",
            params![delta, OffsetDateTime::now_utc()],
        )?;

        match rows_changed {
            0 => Err(capital_overflow()),
            _ => Ok(()),
        }
    }

    fn overwrite(&self, value: i64) -> Result<(), Error> {
        self.connection()?.execute(
            "INSERT INTO capital (id, value, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![value, OffsetDateTime::now_utc()],
        )?;

        Ok(())
    }
}

/// Create the capital table in the database.
///
/// The table holds at most one row (`id = 1`), the value is in minor units.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_capital_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS capital (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            value INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        thread,
    };

    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        Error,
        capital::BalanceKeeper,
        db::initialize,
        transaction::{Amount, TransactionKind},
    };

    use super::SQLiteBalanceKeeper;

    fn get_keeper() -> SQLiteBalanceKeeper {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        SQLiteBalanceKeeper::new(Arc::new(Mutex::new(conn)))
    }

    fn row_count(keeper: &SQLiteBalanceKeeper) -> i64 {
        keeper
            .connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM capital", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn first_read_creates_zero() {
        let keeper = get_keeper();
        assert_eq!(row_count(&keeper), 0);

        assert_eq!(keeper.get(), Ok(Decimal::ZERO));
        assert_eq!(row_count(&keeper), 1);
    }

    #[test]
    fn increment_before_first_read_starts_from_zero() {
        let keeper = get_keeper();

        keeper.increment(-12_000).unwrap();

        assert_eq!(keeper.get(), Ok(Decimal::new(-12_000, 2)));
        assert_eq!(row_count(&keeper), 1);
    }

    #[test]
    fn delta_then_reverse_restores_value() {
        let keeper = get_keeper();
        keeper.increment(4_321).unwrap();
        let amount = Amount::from_minor_units(99_999).unwrap();

        keeper
            .apply_delta(TransactionKind::Expense, amount, false)
            .unwrap();
        keeper
            .apply_delta(TransactionKind::Expense, amount, true)
            .unwrap();

        assert_eq!(keeper.read(), Ok(4_321));
    }

    #[test]
    fn overwrite_replaces_value() {
        let keeper = get_keeper();
        keeper.increment(500).unwrap();

        keeper.overwrite(42).unwrap();

        assert_eq!(keeper.read(), Ok(42));
    }

    #[test]
    fn overflowing_increment_fails_and_keeps_value() {
        let keeper = get_keeper();
        keeper.overwrite(i64::MAX - 10).unwrap();

        assert!(matches!(keeper.increment(11), Err(Error::StoreFailure(_))));
        assert_eq!(keeper.read(), Ok(i64::MAX - 10));

        keeper.overwrite(i64::MIN + 10).unwrap();
        assert!(matches!(keeper.increment(-11), Err(Error::StoreFailure(_))));
        assert_eq!(keeper.read(), Ok(i64::MIN + 10));

        keeper.increment(-10).unwrap();
        assert_eq!(keeper.read(), Ok(i64::MIN));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let keeper = get_keeper();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let keeper = keeper.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        keeper.increment(3).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(keeper.read(), Ok(8 * 50 * 3));
    }
}
