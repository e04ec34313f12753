use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use serde::Deserialize;

use crate::{
    AppState, Error, ListConfig, TransactionCoordinator,
    transaction::{Transaction, TransactionFilter},
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// Reads transactions from the ledger.
    pub coordinator: TransactionCoordinator,
    /// Controls how many transactions are returned by default.
    pub list_config: ListConfig,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            coordinator: state.coordinator.clone(),
            list_config: state.list_config.clone(),
        }
    }
}

/// The query parameters for listing transactions.
///
/// Every field is kept as text so that a bad value falls back to a default
/// instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Text to find in the description or amount.
    pub search: Option<String>,
    /// "income" or "expense", anything else is ignored.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The maximum number of transactions to return.
    pub limit: Option<String>,
}

impl ListQuery {
    fn into_filter(self, list_config: &ListConfig) -> TransactionFilter {
        let kind = self.kind.and_then(|kind| kind.parse().ok());
        let limit = self
            .limit
            .and_then(|limit| limit.trim().parse::<usize>().ok())
            .filter(|&limit| limit > 0)
            .unwrap_or(list_config.default_limit);

        TransactionFilter {
            search: self.search,
            kind,
            limit: Some(limit),
        }
    }
}

/// A route handler that responds with the matching transactions, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let filter = query.into_filter(&state.list_config);

    state.coordinator.list(&filter).map(Json)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{
        ListConfig, endpoints,
        test_utils::{get_test_server, memory_app, sqlite_app},
        transaction::TransactionKind,
    };

    use super::ListQuery;

    fn query(search: Option<&str>, kind: Option<&str>, limit: Option<&str>) -> ListQuery {
        ListQuery {
            search: search.map(str::to_owned),
            kind: kind.map(str::to_owned),
            limit: limit.map(str::to_owned),
        }
    }

    #[test]
    fn bad_limits_fall_back_to_default() {
        let config = ListConfig { default_limit: 50 };

        for limit in [None, Some("abc"), Some("0"), Some("-3"), Some("2.5")] {
            let filter = query(None, None, limit).into_filter(&config);
            assert_eq!(filter.limit, Some(50), "limit {limit:?}");
        }

        assert_eq!(query(None, None, Some("7")).into_filter(&config).limit, Some(7));
    }

    #[test]
    fn unknown_type_is_ignored() {
        let config = ListConfig::default();

        assert_eq!(query(None, Some("refund"), None).into_filter(&config).kind, None);
        assert_eq!(
            query(None, Some("Expense"), None).into_filter(&config).kind,
            Some(TransactionKind::Expense)
        );
    }

    async fn seed(server: &axum_test::TestServer) {
        for body in [
            json!({ "type": "income", "amount": 2500, "description": "Salary" }),
            json!({ "type": "expense", "amount": 42.1, "description": "Groceries" }),
            json!({ "type": "expense", "amount": 9.99, "description": "Music subscription" }),
        ] {
            server
                .post(endpoints::TRANSACTIONS)
                .json(&body)
                .await
                .assert_status_ok();
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let server = get_test_server(sqlite_app());
        seed(&server).await;

        let body: Vec<Value> = server.get(endpoints::TRANSACTIONS).await.json();

        let ids: Vec<_> = body.iter().map(|t| t["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn filters_by_type_and_search() {
        let server = get_test_server(memory_app());
        seed(&server).await;

        let expenses: Vec<Value> = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("type", "expense")
            .await
            .json();
        let groceries: Vec<Value> = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("search", "GROCER")
            .await
            .json();
        let by_amount: Vec<Value> = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("search", "42.10")
            .await
            .json();

        assert_eq!(expenses.len(), 2);
        assert_eq!(groceries.len(), 1);
        assert_eq!(groceries[0]["description"], "Groceries");
        assert_eq!(by_amount.len(), 1);
        assert_eq!(by_amount[0]["amount"], 42.1);
    }

    #[tokio::test]
    async fn applies_limit() {
        let server = get_test_server(sqlite_app());
        seed(&server).await;

        let limited: Vec<Value> = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("limit", "2")
            .await
            .json();
        let bad_limit: Vec<Value> = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("limit", "lots")
            .await
            .json();

        assert_eq!(limited.len(), 2);
        assert_eq!(bad_limit.len(), 3);
    }

    #[tokio::test]
    async fn limit_beyond_sqlite_range_lists_everything() {
        for state in [memory_app(), sqlite_app()] {
            let server = get_test_server(state);
            seed(&server).await;

            let response = server
                .get(endpoints::TRANSACTIONS)
                .add_query_param("limit", "18446744073709551615")
                .await;

            response.assert_status_ok();
            assert_eq!(response.json::<Vec<Value>>().len(), 3);
        }
    }

    #[tokio::test]
    async fn search_folds_case_the_same_on_every_backend() {
        for state in [memory_app(), sqlite_app()] {
            let server = get_test_server(state);
            seed(&server).await;
            server
                .post(endpoints::TRANSACTIONS)
                .json(&json!({ "type": "expense", "amount": 3.8, "description": "Café Über" }))
                .await
                .assert_status_ok();

            let found: Vec<Value> = server
                .get(endpoints::TRANSACTIONS)
                .add_query_param("search", "über")
                .await
                .json();

            assert_eq!(found.len(), 1);
            assert_eq!(found[0]["description"], "Café Über");
        }
    }
}
