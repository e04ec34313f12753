//! Validates untyped JSON request bodies into [NewTransaction] and [TransactionPatch].
//!
//! Every field is checked before anything is returned, so a bad request gets
//! one error listing all of its problems.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{
    Error,
    transaction::{Amount, NewTransaction, TransactionKind, TransactionPatch},
};

/// The JSON body for creating or updating a transaction, before validation.
///
/// A field that is missing from the body is `None`, a field sent as `null` is
/// `Some(Value::Null)`.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionPayload {
    /// Either "income" or "expense".
    #[serde(default, rename = "type", deserialize_with = "present")]
    pub kind: Option<Value>,
    /// A non-negative number or numeric string.
    #[serde(default, deserialize_with = "present")]
    pub amount: Option<Value>,
    /// Free text.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    /// An ISO-8601 date or RFC 3339 date-time.
    #[serde(default, deserialize_with = "present")]
    pub date: Option<Value>,
}

impl TransactionPayload {
    /// Validate the body of a create request.
    ///
    /// # Errors
    /// Returns [Error::InvalidInput] listing every problem with the body.
    pub fn into_new_transaction(self) -> Result<NewTransaction, Error> {
        let mut problems = Vec::new();

        let kind = match self.kind {
            None | Some(Value::Null) => {
                problems.push("type is required".to_owned());
                None
            }
            Some(value) => collect(parse_kind(&value), &mut problems),
        };

        let amount = match self.amount {
            None | Some(Value::Null) => {
                problems.push("amount is required".to_owned());
                None
            }
            Some(value) => collect(parse_amount(&value), &mut problems),
        };

        let description = self
            .description
            .and_then(|value| collect(parse_description(&value), &mut problems))
            .flatten();

        let date = self
            .date
            .and_then(|value| collect(parse_date(&value), &mut problems))
            .flatten();

        match (kind, amount) {
            (Some(kind), Some(amount)) if problems.is_empty() => Ok(NewTransaction::new(kind, amount)
                .description(description)
                .date(date)),
            _ => Err(Error::InvalidInput(problems)),
        }
    }

    /// Validate the body of a partial update request.
    ///
    /// Missing fields are left unchanged. `null` clears the description or
    /// date, but is rejected for the type and amount.
    ///
    /// # Errors
    /// Returns [Error::InvalidInput] listing every problem with the body.
    pub fn into_patch(self) -> Result<TransactionPatch, Error> {
        let mut problems = Vec::new();

        let kind = match self.kind {
            None => None,
            Some(Value::Null) => {
                problems.push("type cannot be null".to_owned());
                None
            }
            Some(value) => collect(parse_kind(&value), &mut problems),
        };

        let amount = match self.amount {
            None => None,
            Some(Value::Null) => {
                problems.push("amount cannot be null".to_owned());
                None
            }
            Some(value) => collect(parse_amount(&value), &mut problems),
        };

        let description = self
            .description
            .and_then(|value| collect(parse_description(&value), &mut problems));

        let date = self
            .date
            .and_then(|value| collect(parse_date(&value), &mut problems));

        if problems.is_empty() {
            Ok(TransactionPatch {
                kind,
                amount,
                description,
                date,
            })
        } else {
            Err(Error::InvalidInput(problems))
        }
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)` instead of collapsing it to `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn collect<T>(result: Result<T, String>, problems: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(problem) => {
            problems.push(problem);
            None
        }
    }
}

fn parse_kind(value: &Value) -> Result<TransactionKind, String> {
    value
        .as_str()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| "type must be either \"income\" or \"expense\"".to_owned())
}

fn parse_amount(value: &Value) -> Result<Amount, String> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_owned(),
        _ => return Err("amount must be a number".to_owned()),
    };

    let decimal = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| "amount must be a number".to_owned())?;

    Amount::from_decimal(decimal).map_err(|error| error.to_string())
}

/// Blank descriptions are stored as no description.
fn parse_description(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => Ok(Some(text.trim().to_owned())),
        _ => Err("description must be text".to_owned()),
    }
}

fn parse_date(value: &Value) -> Result<Option<Date>, String> {
    const INVALID_DATE: &str = "date must be an ISO-8601 date, e.g. \"2025-01-31\"";

    let text = match value {
        Value::Null => return Ok(None),
        Value::String(text) if text.trim().is_empty() => return Ok(None),
        Value::String(text) => text.trim(),
        _ => return Err(INVALID_DATE.to_owned()),
    };

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .or_else(|_| OffsetDateTime::parse(text, &Rfc3339).map(|date_time| date_time.date()))
        .map(Some)
        .map_err(|_| INVALID_DATE.to_owned())
}
