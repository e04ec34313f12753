//! Database ID type definition.

/// Alias for the integer type used as the opaque transaction identifier.
pub type TransactionId = i64;
