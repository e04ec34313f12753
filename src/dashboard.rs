//! The dashboard page that shows capital and the latest transactions.

use axum::extract::{FromRef, State};
use maud::{Markup, PreEscaped, html};

use crate::{
    AppState, Error, ListConfig, TransactionCoordinator, endpoints,
    endpoints::format_endpoint,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    transaction::{Transaction, TransactionFilter, TransactionKind},
};

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// Reads capital and transactions.
    pub coordinator: TransactionCoordinator,
    /// Controls how many transactions are shown.
    pub list_config: ListConfig,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            coordinator: state.coordinator.clone(),
            list_config: state.list_config.clone(),
        }
    }
}

/// Submits the form as JSON and wires up the delete buttons, then reloads the
/// page so capital and the table are shown fresh.
const DASHBOARD_SCRIPT: &str = r#"
document.getElementById("new-transaction").addEventListener("submit", async (event) => {
    event.preventDefault();
    const form = event.target;
    const body = {
        type: form.elements["type"].value,
        amount: form.elements["amount"].value,
        description: form.elements["description"].value,
        date: form.elements["date"].value || null,
    };
    const response = await fetch(form.dataset.endpoint, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
    });
    if (response.ok) {
        window.location.reload();
    } else {
        const error = await response.json();
        document.getElementById("form-errors").textContent =
            (error.details || [error.error]).join(", ");
    }
});

for (const button of document.querySelectorAll("button[data-delete]")) {
    button.addEventListener("click", async () => {
        const response = await fetch(button.dataset.delete, { method: "DELETE" });
        if (response.ok || response.status === 404) {
            window.location.reload();
        }
    });
}
"#;

/// Display a page with capital, a form for recording a transaction and the
/// latest transactions.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Markup, Error> {
    let capital = state.coordinator.capital()?;
    let transactions = state.coordinator.list(&TransactionFilter {
        limit: Some(state.list_config.default_limit),
        ..TransactionFilter::all()
    })?;

    let capital_style = if capital.is_sign_negative() && !capital.is_zero() {
        "text-red-600"
    } else {
        "text-green-700"
    };

    let content = html! {
        h1 { "Capital Ledger" }

        section id="capital"
        {
            h2 { "Capital" }
            p class=(capital_style) data-capital=(capital) { (format_currency(capital)) }
        }

        section
        {
            h2 { "Record a transaction" }
            (transaction_form())
        }

        section id="transactions"
        {
            h2 { "Latest transactions" }
            (transaction_table(&transactions))
        }

        script { (PreEscaped(DASHBOARD_SCRIPT)) }
    };

    Ok(base("Dashboard", &content))
}

fn transaction_form() -> Markup {
    html! {
        form id="new-transaction" data-endpoint=(endpoints::TRANSACTIONS)
        {
            select name="type" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value=(TransactionKind::Income.as_str()) { "Income" }
                option value=(TransactionKind::Expense.as_str()) selected { "Expense" }
            }
            input type="number" name="amount" min="0" step="0.01" required
                placeholder="0.00" class=(FORM_TEXT_INPUT_STYLE);
            input type="text" name="description" placeholder="Description"
                class=(FORM_TEXT_INPUT_STYLE);
            input type="date" name="date" class=(FORM_TEXT_INPUT_STYLE);
            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add" }
            p id="form-errors" class="text-red-600" {}
        }
    }
}

fn transaction_table(transactions: &[Transaction]) -> Markup {
    html! {
        table
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th class=(TABLE_CELL_STYLE) { "Date" }
                    th class=(TABLE_CELL_STYLE) { "Description" }
                    th class=(TABLE_CELL_STYLE) { "Type" }
                    th class=(TABLE_CELL_STYLE) { "Amount" }
                    th class=(TABLE_CELL_STYLE) {}
                }
            }

            tbody
            {
                @for transaction in transactions
                {
                    tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                    {
                        td class=(TABLE_CELL_STYLE) { (transaction.display_date()) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            (transaction.description.as_deref().unwrap_or(""))
                        }
                        td class=(TABLE_CELL_STYLE) { (transaction.kind) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            (format_currency(transaction.amount.to_decimal()))
                        }
                        td class=(TABLE_CELL_STYLE)
                        {
                            button
                                type="button"
                                class=(BUTTON_DELETE_STYLE)
                                data-delete=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                            {
                                "Delete"
                            }
                        }
                    }
                }

                @if transactions.is_empty()
                {
                    tr
                    {
                        td colspan="5" class=(TABLE_CELL_STYLE) { "No transactions yet." }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod dashboard_route_tests {
    use scraper::{ElementRef, Html, Selector};
    use time::{OffsetDateTime, macros::date};

    use crate::{
        endpoints,
        test_utils::{amount, get_test_server, memory_app},
        transaction::{NewTransaction, TransactionKind},
    };

    async fn get_dashboard(state: crate::AppState) -> Html {
        let server = get_test_server(state);
        let response = server.get(endpoints::ROOT).await;
        response.assert_status_ok();

        let document = Html::parse_document(&response.text());
        assert!(
            document.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            document.errors
        );

        document
    }

    fn select<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
        let selector = Selector::parse(selector).unwrap();
        document.select(&selector).collect()
    }

    fn text(element: &ElementRef) -> String {
        element.text().collect::<String>().trim().to_owned()
    }

    #[tokio::test]
    async fn shows_zero_capital_and_empty_table() {
        let document = get_dashboard(memory_app()).await;

        let capital = select(&document, "#capital p");
        assert_eq!(capital.len(), 1);
        assert_eq!(text(&capital[0]), "$0.00");
        let rows = select(&document, "#transactions tbody tr");
        assert_eq!(rows.len(), 1);
        assert_eq!(text(&rows[0]), "No transactions yet.");
    }

    #[tokio::test]
    async fn shows_capital_and_transactions() {
        let state = memory_app();
        state
            .coordinator
            .create(
                NewTransaction::new(TransactionKind::Income, amount(1_000_00))
                    .description(Some("Salary".to_owned()))
                    .date(Some(date!(2025 - 01 - 15))),
            )
            .unwrap();
        state
            .coordinator
            .create(NewTransaction::new(TransactionKind::Expense, amount(1_130_00)))
            .unwrap();

        let document = get_dashboard(state).await;

        let capital = select(&document, "#capital p");
        assert_eq!(text(&capital[0]), "-$130.00");

        let rows = select(&document, "#transactions tbody tr");
        assert_eq!(rows.len(), 2);

        let cells: Vec<_> = select(&document, "#transactions tbody tr:nth-child(1) td")
            .iter()
            .map(text)
            .collect();
        let today = OffsetDateTime::now_utc().date().to_string();
        assert_eq!(cells[0], today, "a missing date should fall back to created_at");
        assert_eq!(cells[2], "expense");
        assert_eq!(cells[3], "$1,130.00");

        let cells: Vec<_> = select(&document, "#transactions tbody tr:nth-child(2) td")
            .iter()
            .map(text)
            .collect();
        assert_eq!(cells[0], "2025-01-15");
        assert_eq!(cells[1], "Salary");
        assert_eq!(cells[2], "income");
        assert_eq!(cells[3], "$1,000.00");
    }

    #[tokio::test]
    async fn delete_buttons_target_transaction_routes() {
        let state = memory_app();
        let created = state
            .coordinator
            .create(NewTransaction::new(TransactionKind::Income, amount(5_00)))
            .unwrap();

        let document = get_dashboard(state).await;

        let buttons = select(&document, "button[data-delete]");
        assert_eq!(buttons.len(), 1);
        assert_eq!(
            buttons[0].value().attr("data-delete"),
            Some(format!("/transactions/{}", created.id).as_str())
        );
    }

    #[tokio::test]
    async fn form_posts_to_transactions_route() {
        let document = get_dashboard(memory_app()).await;

        let forms = select(&document, "form#new-transaction");
        assert_eq!(forms.len(), 1);
        assert_eq!(
            forms[0].value().attr("data-endpoint"),
            Some(endpoints::TRANSACTIONS)
        );
        for name in ["type", "amount", "description", "date"] {
            assert_eq!(
                select(&document, &format!("form#new-transaction [name={name}]")).len(),
                1,
                "missing form field {name}"
            );
        }
    }
}
