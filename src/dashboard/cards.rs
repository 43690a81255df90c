//! The summary cards at the top of the dashboard.

use maud::{Markup, html};

use crate::{dashboard::aggregation::LedgerTotals, html::format_currency};

const CARD_STYLE: &str = "flex flex-col gap-1 p-4 rounded-lg shadow \
    bg-white dark:bg-gray-800";
const CARD_LABEL_STYLE: &str = "text-sm text-gray-600 dark:text-gray-400";
const CARD_VALUE_STYLE: &str = "text-2xl font-semibold";
const EXPENSE_VALUE_STYLE: &str = "text-red-600 dark:text-red-400";
const INCOME_VALUE_STYLE: &str = "text-green-600 dark:text-green-400";

fn balance_value_style(balance: f64) -> &'static str {
    if balance >= 0.0 {
        INCOME_VALUE_STYLE
    } else {
        EXPENSE_VALUE_STYLE
    }
}

fn summary_card(id: &str, label: &str, value: f64, value_style: &str) -> Markup {
    html! {
        div id=(id) class=(CARD_STYLE)
        {
            span class=(CARD_LABEL_STYLE) { (label) }
            span class={(CARD_VALUE_STYLE) " " (value_style)} { (format_currency(value)) }
        }
    }
}

/// Renders the total expenses, total income and balance cards.
pub(super) fn summary_cards_view(totals: &LedgerTotals) -> Markup {
    let balance = totals.balance();

    html! {
        section id="summary" class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 sm:grid-cols-3 gap-4"
            {
                (summary_card("total-expenses", "Total Expenses", totals.expenses, EXPENSE_VALUE_STYLE))
                (summary_card("total-income", "Total Income", totals.income, INCOME_VALUE_STYLE))
                (summary_card("balance", "Balance", balance, balance_value_style(balance)))
            }
        }
    }
}
