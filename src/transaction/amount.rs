//! The non-negative monetary magnitude of a transaction.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The number of decimal places kept for every amount.
pub const AMOUNT_SCALE: u32 = 2;

/// The largest accepted amount in minor units, i.e. 10,000,000,000,000.00.
///
/// Bounding single amounts keeps every capital delta far from `i64` overflow.
pub const MAX_AMOUNT_MINOR_UNITS: i64 = 1_000_000_000_000_000;

/// A non-negative amount of money with exactly two decimal places.
///
/// The amount is held in minor units (e.g. cents) so that stored values and
/// capital arithmetic are exact integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

/// Why a decimal could not be turned into an [Amount].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Amounts are magnitudes, the transaction kind carries the sign.
    #[error("amount must not be negative")]
    Negative,
    /// The amount is above [MAX_AMOUNT_MINOR_UNITS].
    #[error("amount must not exceed 10000000000000.00")]
    TooLarge,
}

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Normalize `value` to two decimal places.
    ///
    /// Values are rounded half away from zero, so `10.005` becomes `10.01`.
    ///
    /// # Errors
    /// Returns [AmountError::Negative] for values below zero (checked before
    /// rounding) and [AmountError::TooLarge] above [MAX_AMOUNT_MINOR_UNITS].
    pub fn from_decimal(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative);
        }

        let rounded =
            value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);

        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|minor_units| minor_units.to_i64())
            .ok_or(AmountError::TooLarge)
            .and_then(Amount::from_minor_units)
    }

    /// Create an amount from minor units, e.g. `Amount::from_minor_units(1250)` is 12.50.
    ///
    /// # Errors
    /// Returns [AmountError::Negative] if `minor_units` is below zero and
    /// [AmountError::TooLarge] above [MAX_AMOUNT_MINOR_UNITS].
    pub fn from_minor_units(minor_units: i64) -> Result<Self, AmountError> {
        if minor_units < 0 {
            Err(AmountError::Negative)
        } else if minor_units > MAX_AMOUNT_MINOR_UNITS {
            Err(AmountError::TooLarge)
        } else {
            Ok(Amount(minor_units))
        }
    }

    /// The amount in minor units.
    pub fn minor_units(self) -> i64 {
        self.0
    }

    /// The amount as a decimal with two decimal places.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, AMOUNT_SCALE)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = <Decimal as Deserialize>::deserialize(deserializer)?;

        Amount::from_decimal(value).map_err(D::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let minor_units = i64::column_result(value)?;

        Amount::from_minor_units(minor_units).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
