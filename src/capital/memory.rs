//! Implements an in-memory balance keeper.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::{
    Error,
    capital::{BalanceKeeper, core::capital_overflow},
};

/// Keeps capital in an atomic integer.
///
/// Capital starts at zero, so the first read needs no separate initialization.
#[derive(Debug, Default)]
pub struct InMemoryBalanceKeeper {
    value: AtomicI64,
}

impl InMemoryBalanceKeeper {
    /// Create a balance keeper with zero capital.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceKeeper for InMemoryBalanceKeeper {
    fn read(&self) -> Result<i64, Error> {
        Ok(self.value.load(Ordering::SeqCst))
    }

    fn increment(&self, delta: i64) -> Result<(), Error> {
        self.value
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                value.checked_add(delta)
            })
            .map(|_| ())
            .map_err(|_| capital_overflow())
    }

    fn overwrite(&self, value: i64) -> Result<(), Error> {
        self.value.store(value, Ordering::SeqCst);

        Ok(())
    }
}
