//! Shared markup and formatting helpers for HTML pages.

use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, PreEscaped, html};
use numfmt::{Formatter, Precision};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

pub const TABLE_HEADER_STYLE: &str = "text-left text-xs uppercase text-gray-700";
pub const TABLE_ROW_STYLE: &str = "border-b border-gray-200";
pub const TABLE_CELL_STYLE: &str = "px-4 py-2";
pub const BUTTON_PRIMARY_STYLE: &str = "px-4 py-2 bg-blue-600 text-white rounded";
pub const BUTTON_DELETE_STYLE: &str = "text-red-600 underline bg-transparent border-none cursor-pointer";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2 rounded border border-gray-300";

const BASE_STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f9fafb; color: #111827; }
main { max-width: 60rem; margin: 0 auto; padding: 2rem 1rem; }
table { width: 100%; border-collapse: collapse; }
.text-left { text-align: left; }
.px-4 { padding-left: 1rem; padding-right: 1rem; }
.py-2 { padding-top: 0.5rem; padding-bottom: 0.5rem; }
.border-b { border-bottom: 1px solid #e5e7eb; }
.text-red-600 { color: #dc2626; }
.text-green-700 { color: #15803d; }
.bg-blue-600 { background: #2563eb; color: white; border: none; }
.rounded { border-radius: 0.25rem; }
"#;

/// Wrap `content` in a complete HTML document.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Capital Ledger" }
                style { (PreEscaped(BASE_STYLE)) }
            }

            body
            {
                main { (content) }
            }
        }
    }
}

/// Format `amount` as dollars with thousands separators and two decimal places,
/// e.g. "-$1,234.50".
pub fn format_currency(amount: Decimal) -> String {
    let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };

    let amount = amount.abs();
    let dollars = amount.trunc();
    let cents = ((amount - dollars) * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or_default();

    format!("{sign}{}.{cents:02}", format_dollars(dollars))
}

fn format_dollars(dollars: Decimal) -> String {
    static DOLLAR_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let formatter = DOLLAR_FMT.get_or_init(|| {
        Formatter::currency("$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(0)))
    });

    // numfmt renders zero as "0" without the prefix.
    if dollars.is_zero() {
        return "$0".to_owned();
    }

    match (formatter, dollars.to_f64()) {
        (Some(formatter), Some(dollars)) => formatter.fmt_string(dollars),
        _ => format!("${dollars}"),
    }
}
