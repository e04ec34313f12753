//! Defines the ledger store trait.

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{NewTransaction, Replaced, Transaction, TransactionKind, TransactionPatch},
};

/// Handles the durable storage of transactions.
///
/// The store is the sole source of truth for which transactions exist.
/// Implementations must report a missing transaction as [Error::NotFound] and
/// every other failure as [Error::StoreFailure].
pub trait LedgerStore: Send + Sync {
    /// Store a new transaction, assigning its ID and creation time.
    fn insert(&self, transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Retrieve a transaction by its `id`.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Apply `patch` to the transaction `id`.
    ///
    /// The previous and updated records are read and written as one atomic
    /// step, so concurrent updates each see their own before/after pair.
    fn replace(&self, id: TransactionId, patch: &TransactionPatch) -> Result<Replaced, Error>;

    /// Remove the transaction `id`, returning the removed record.
    fn remove(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Retrieve the transactions that match `filter`, newest first.
    fn list_all(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, Error>;
}

/// Defines which transactions [LedgerStore::list_all] returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Case-insensitive text to find in the description or the amount
    /// formatted with two decimal places.
    pub search: Option<String>,
    /// Only include transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Selects up to the first N (`limit`) transactions. `None` returns all.
    pub limit: Option<usize>,
}

impl TransactionFilter {
    /// A filter that selects every transaction.
    pub fn all() -> Self {
        Self::default()
    }

    /// The search text, ignoring blank searches.
    pub(crate) fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
    }

    /// Whether `transaction` satisfies the search and kind criteria.
    ///
    /// The limit is not considered.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if self.kind.is_some_and(|kind| kind != transaction.kind) {
            return false;
        }

        let Some(search) = self.search_text() else {
            return true;
        };
        let search = search.to_lowercase();

        let description_matches = transaction
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(&search));

        description_matches || transaction.amount.to_string().contains(&search)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::transaction::{
        Amount, NewTransaction, Transaction, TransactionFilter, TransactionKind,
    };

    fn transaction(kind: TransactionKind, minor_units: i64, description: &str) -> Transaction {
        NewTransaction::new(kind, Amount::from_minor_units(minor_units).unwrap())
            .description(Some(description.to_owned()))
            .into_transaction(1, datetime!(2025-01-01 00:00 UTC))
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TransactionFilter::all();

        assert!(filter.matches(&transaction(TransactionKind::Income, 1, "a")));
        assert!(filter.matches(&transaction(TransactionKind::Expense, 1, "b")));
    }

    #[test]
    fn filters_by_kind() {
        let filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            ..Default::default()
        };

        assert!(!filter.matches(&transaction(TransactionKind::Income, 1, "a")));
        assert!(filter.matches(&transaction(TransactionKind::Expense, 1, "a")));
    }

    #[test]
    fn search_ignores_case() {
        let filter = TransactionFilter {
            search: Some("COFFEE".to_owned()),
            ..Default::default()
        };

        assert!(filter.matches(&transaction(TransactionKind::Expense, 450, "Morning coffee")));
        assert!(!filter.matches(&transaction(TransactionKind::Expense, 450, "Groceries")));
    }

    #[test]
    fn search_matches_formatted_amount() {
        let filter = TransactionFilter {
            search: Some("12.50".to_owned()),
            ..Default::default()
        };

        assert!(filter.matches(&transaction(TransactionKind::Expense, 1250, "Lunch")));
        assert!(!filter.matches(&transaction(TransactionKind::Expense, 1205, "Lunch")));
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = TransactionFilter {
            search: Some("   ".to_owned()),
            ..Default::default()
        };

        assert!(filter.matches(&transaction(TransactionKind::Income, 1, "anything")));
    }
}
