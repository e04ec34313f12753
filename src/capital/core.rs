//! Defines the balance keeper trait and the capital delta arithmetic.

use rust_decimal::Decimal;

use crate::{
    Error,
    transaction::{Amount, AMOUNT_SCALE, LedgerStore, TransactionFilter, TransactionKind},
};

/// Convert a capital value held in minor units into a decimal.
pub(crate) fn to_decimal(minor_units: i64) -> Decimal {
    Decimal::new(minor_units, AMOUNT_SCALE)
}

pub(crate) fn capital_overflow() -> Error {
    Error::StoreFailure("capital would overflow".to_owned())
}

/// The signed change to capital caused by applying (or reversing) one transaction.
///
/// Income adds to capital and expenses subtract from it. `reverse` flips the
/// sign so a transaction can be taken back out.
///
/// # Errors
/// Returns an [Error::StoreFailure] if the delta does not fit in an `i64`.
pub fn signed_delta(kind: TransactionKind, amount: Amount, reverse: bool) -> Result<i64, Error> {
    let direction = if reverse { -1 } else { 1 };

    kind.sign()
        .checked_mul(direction)
        .and_then(|sign| sign.checked_mul(amount.minor_units()))
        .ok_or_else(capital_overflow)
}

/// The net change to capital when a transaction is edited from the old kind
/// and amount to the new ones.
///
/// # Errors
/// Returns an [Error::StoreFailure] if the delta does not fit in an `i64`.
pub fn net_edit_delta(
    old_kind: TransactionKind,
    old_amount: Amount,
    new_kind: TransactionKind,
    new_amount: Amount,
) -> Result<i64, Error> {
    signed_delta(new_kind, new_amount, false)?
        .checked_add(signed_delta(old_kind, old_amount, true)?)
        .ok_or_else(capital_overflow)
}

/// Owns the single running capital value.
///
/// Implementers provide the storage primitives [BalanceKeeper::read],
/// [BalanceKeeper::increment] and [BalanceKeeper::overwrite]. `increment`
/// must be one atomic update at the storage layer so that concurrent deltas
/// are never lost.
pub trait BalanceKeeper: Send + Sync {
    /// Read the stored capital in minor units, creating it as zero if it does
    /// not exist yet.
    fn read(&self) -> Result<i64, Error>;

    /// Atomically add `delta` minor units to the stored capital.
    ///
    /// Fails without changing anything if the result would overflow.
    fn increment(&self, delta: i64) -> Result<(), Error>;

    /// Replace the stored capital with `value` minor units.
    fn overwrite(&self, value: i64) -> Result<(), Error>;

    /// The current capital.
    fn get(&self) -> Result<Decimal, Error> {
        self.read().map(to_decimal)
    }

    /// Add (or with `reverse`, remove) the effect of one transaction.
    fn apply_delta(&self, kind: TransactionKind, amount: Amount, reverse: bool) -> Result<(), Error> {
        self.increment(signed_delta(kind, amount, reverse)?)
    }

    /// Replace the effect of an edited transaction with one net increment.
    ///
    /// Equivalent to reversing the old values and applying the new ones, but
    /// no intermediate value is ever stored.
    fn reconcile_edit(
        &self,
        old_kind: TransactionKind,
        old_amount: Amount,
        new_kind: TransactionKind,
        new_amount: Amount,
    ) -> Result<(), Error> {
        self.increment(net_edit_delta(old_kind, old_amount, new_kind, new_amount)?)
    }

    /// Recompute capital from every transaction in `ledger` and store it.
    ///
    /// This is the repair path for drift and the bootstrap path for existing
    /// data, not the steady state.
    fn recompute(&self, ledger: &dyn LedgerStore) -> Result<Decimal, Error> {
        let total = ledger_total(ledger)?;
        self.overwrite(total)?;

        Ok(to_decimal(total))
    }
}

/// The signed sum of every transaction in `ledger`, in minor units.
///
/// # Errors
/// Returns an [Error::StoreFailure] if the ledger cannot be read or the sum
/// overflows.
pub fn ledger_total(ledger: &dyn LedgerStore) -> Result<i64, Error> {
    ledger
        .list_all(&TransactionFilter::all())?
        .iter()
        .try_fold(0i64, |total, transaction| {
            total.checked_add(transaction.signed_minor_units())
        })
        .ok_or_else(|| Error::StoreFailure("the ledger total overflowed".to_owned()))
}
