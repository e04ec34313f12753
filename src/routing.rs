//! Application router configuration.

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::{
    AppState,
    capital::{get_capital_endpoint, reconcile_capital_endpoint},
    dashboard::get_dashboard_page,
    endpoints,
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_dashboard_page))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            patch(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::CAPITAL, get(get_capital_endpoint))
        .route(endpoints::RECONCILE_CAPITAL, post(reconcile_capital_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}
