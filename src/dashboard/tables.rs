//! The transaction table shown under the dashboard charts.

use maud::{Markup, html};
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
    ledger::{Kind, Transaction},
};

const TABLE_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day]/[month]/[year] [hour]:[minute]");
const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

/// The label shown for a stored card type token.
fn card_type_label(token: &str) -> &str {
    match token {
        "debit" => "Debit",
        "credit" => "Credit",
        "other_cash_pix" => "Other/Cash/Pix",
        "" => "-",
        other => other,
    }
}

fn kind_style(kind: Kind) -> &'static str {
    match kind {
        Kind::Expense => TABLE_CELL_RED_STYLE,
        Kind::Income => TABLE_CELL_GREEN_STYLE,
    }
}

/// Renders `transactions` in the order given, which is newest first when
/// they come from [list_transactions](crate::ledger::list_transactions).
pub(super) fn transactions_table(transactions: &[Transaction]) -> Markup {
    html! {
        section id="transactions" class="w-full mx-auto mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { "Transactions" }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Card Type" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Bank or Source" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                            {
                                td class={(TABLE_CELL_STYLE) " whitespace-nowrap"}
                                {
                                    (transaction.occurred_at.format(TABLE_DATE_FORMAT).unwrap_or_default())
                                }
                                td class={(TABLE_CELL_STYLE) " " (kind_style(transaction.kind))}
                                {
                                    (crate::capitalise_first_char(transaction.kind.as_str()))
                                }
                                td class={(TABLE_CELL_STYLE) " text-right whitespace-nowrap"}
                                {
                                    (format_currency(transaction.amount))
                                }
                                td class=(TABLE_CELL_STYLE) { (card_type_label(&transaction.card_type)) }
                                td class=(TABLE_CELL_STYLE) { (transaction.bank_or_source) }
                                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                            }
                        }
                    }
                }
            }
        }
    }
}
