//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}', use [format_endpoint].

/// The dashboard page.
pub const ROOT: &str = "/";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route to read capital.
pub const CAPITAL: &str = "/capital";
/// The route to recompute capital from the ledger.
pub const RECONCILE_CAPITAL: &str = "/capital/reconcile";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with the next right brace,
/// e.g. '{transaction_id}' in '/transactions/{transaction_id}'. Only the
/// first parameter is replaced. If there is no parameter, `endpoint_path` is
/// returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}

#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::TRANSACTIONS,
            endpoints::TRANSACTION,
            endpoints::CAPITAL,
            endpoints::RECONCILE_CAPITAL,
        ] {
            assert!(endpoint.parse::<Uri>().is_ok(), "{endpoint} is not a valid URI");
        }
    }

    #[test]
    fn replaces_parameter() {
        let formatted_path = format_endpoint(endpoints::TRANSACTION, 42);

        assert_eq!(formatted_path, "/transactions/42");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        assert_eq!(format_endpoint("/a/{id}/b", 7), "/a/7/b");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint(endpoints::CAPITAL, 1), "/capital");
    }

    #[test]
    fn unterminated_parameter_runs_to_end() {
        assert_eq!(format_endpoint("/a/{id", 3), "/a/3");
    }
}
