use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    Error,
    capital::{BalanceKeeper, InMemoryBalanceKeeper},
};

/// An in-memory balance keeper whose writes fail on demand.
///
/// Reads always succeed so tests can observe the drift a failed write leaves.
#[derive(Debug, Default)]
pub(crate) struct FailingBalanceKeeper {
    inner: InMemoryBalanceKeeper,
    fail_writes: AtomicBool,
}

impl FailingBalanceKeeper {
    pub(crate) fn fail_next_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::StoreFailure("balance keeper is unavailable".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl BalanceKeeper for FailingBalanceKeeper {
    fn read(&self) -> Result<i64, Error> {
        self.inner.read()
    }

    fn increment(&self, delta: i64) -> Result<(), Error> {
        self.check()?;
        self.inner.increment(delta)
    }

    fn overwrite(&self, value: i64) -> Result<(), Error> {
        self.check()?;
        self.inner.overwrite(value)
    }
}
