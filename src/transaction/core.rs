//! Defines the core data models for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{database_id::TransactionId, transaction::Amount};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, adds to capital.
    Income,
    /// Money spent, subtracts from capital.
    Expense,
}

impl TransactionKind {
    /// The sign this kind contributes to capital: `+1` for income, `-1` for expenses.
    pub fn sign(self) -> i64 {
        match self {
            TransactionKind::Income => 1,
            TransactionKind::Expense => -1,
        }
    }

    /// The name used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The string was not "income" or "expense".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction type \"{0}\"")]
pub struct UnknownKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownKind;

    /// Parse a kind, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(UnknownKind(s.to_owned())),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction, assigned by the ledger store.
    pub id: TransactionId,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The magnitude of the transaction.
    pub amount: Amount,
    /// A text description of what the transaction was for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the transaction happened, if the user said so.
    ///
    /// Left empty when not supplied. Views fall back to `created_at` when
    /// displaying the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    /// When the transaction was recorded. Never changes.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// The change this transaction contributes to capital, in minor units.
    pub fn signed_minor_units(&self) -> i64 {
        self.kind.sign() * self.amount.minor_units()
    }

    /// The date to show for this transaction.
    pub fn display_date(&self) -> Date {
        self.date.unwrap_or_else(|| self.created_at.date())
    }
}

/// A validated transaction that has not been stored yet.
///
/// To create a new `NewTransaction`, use [NewTransaction::new] and the
/// builder-style setters.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,
    /// The magnitude of the transaction.
    pub amount: Amount,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// When the transaction happened.
    pub date: Option<Date>,
}

impl NewTransaction {
    /// Create a new transaction with no description or date.
    pub fn new(kind: TransactionKind, amount: Amount) -> Self {
        Self {
            kind,
            amount,
            description: None,
            date: None,
        }
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the date for the transaction.
    pub fn date(mut self, date: Option<Date>) -> Self {
        self.date = date;
        self
    }

    /// Turn the new transaction into a stored one.
    pub(crate) fn into_transaction(
        self,
        id: TransactionId,
        created_at: OffsetDateTime,
    ) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            amount: self.amount,
            description: self.description,
            date: self.date,
            created_at,
        }
    }
}

/// A partial update to a transaction.
///
/// `None` keeps the current value. For the optional fields, `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    /// The new kind.
    pub kind: Option<TransactionKind>,
    /// The new amount.
    pub amount: Option<Amount>,
    /// The new description, `Some(None)` removes it.
    pub description: Option<Option<String>>,
    /// The new date, `Some(None)` removes it.
    pub date: Option<Option<Date>>,
}

impl TransactionPatch {
    /// Whether the patch leaves every field as it is.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.amount.is_none()
            && self.description.is_none()
            && self.date.is_none()
    }

    /// Apply the patch to `transaction`, returning the updated copy.
    ///
    /// `id` and `created_at` are never changed.
    pub fn apply_to(&self, transaction: &Transaction) -> Transaction {
        Transaction {
            id: transaction.id,
            kind: self.kind.unwrap_or(transaction.kind),
            amount: self.amount.unwrap_or(transaction.amount),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| transaction.description.clone()),
            date: self.date.unwrap_or(transaction.date),
            created_at: transaction.created_at,
        }
    }
}

/// The before and after snapshots of a replaced transaction.
///
/// Both are captured in one atomic step by the store, so the pair describes
/// exactly the change made by one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Replaced {
    /// The transaction as it was before the update.
    pub previous: Transaction,
    /// The transaction as it is after the update.
    pub current: Transaction,
}

// ============================================================================
// TESTS
// ============================================================================
