//! Defines the route handler for the page for recording a new transaction.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error, LedgerConfig, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        currency_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_now,
};

const TIME_INPUT_FORMAT: &[BorrowedFormatItem] = format_description!("[hour]:[minute]");

/// The card types offered on the form as (value, label) pairs.
///
/// The values are the normalized tokens stored in the ledger.
const CARD_TYPES: [(&str, &str); 3] = [
    ("debit", "Debit"),
    ("credit", "Credit"),
    ("other_cash_pix", "Other/Cash/Pix"),
];

fn radio_option(name: &str, value: &str, label: &str, checked: bool) -> Markup {
    let id = format!("{name}-{value}");

    html! {
        div class="flex items-center gap-3"
        {
            input
                type="radio"
                name=(name)
                id=(id)
                value=(value)
                class=(FORM_RADIO_INPUT_STYLE)
                required
                checked[checked];

            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (label) }
        }
    }
}

fn new_transaction_view(now: PrimitiveDateTime, record_time_of_day: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let spinner = loading_spinner();
    let time_value = now.time().format(TIME_INPUT_FORMAT).unwrap_or_default();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-swap="none"
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Transaction" }

                fieldset
                {
                    legend class=(FORM_LABEL_STYLE) { "Kind" }

                    div class=(FORM_RADIO_GROUP_STYLE)
                    {
                        (radio_option("kind", "expense", "Expense", true))
                        (radio_option("kind", "income", "Income", false))
                    }
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    // w-full needed to ensure input takes the full width when prefilled with a value
                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            min="0.01"
                            placeholder="0,00"
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                fieldset
                {
                    legend class=(FORM_LABEL_STYLE) { "Card Type" }

                    div class=(FORM_RADIO_GROUP_STYLE)
                    {
                        @for (index, (value, label)) in CARD_TYPES.iter().enumerate() {
                            (radio_option("card_type", value, label, index == 0))
                        }
                    }
                }

                div
                {
                    label for="bank_or_source" class=(FORM_LABEL_STYLE) { "Bank or Source" }

                    input
                        name="bank_or_source"
                        id="bank_or_source"
                        type="text"
                        placeholder="Nubank"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                    input
                        name="description"
                        id="description"
                        type="text"
                        placeholder="Groceries"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        name="date"
                        id="date"
                        type="date"
                        required
                        value=(now.date())
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                @if record_time_of_day {
                    div
                    {
                        label for="time" class=(FORM_LABEL_STYLE) { "Time" }

                        input
                            name="time"
                            id="time"
                            type="time"
                            required
                            value=(time_value)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Record Transaction"
                }
            }
        }
    };

    base("New Transaction", &[currency_input_styles()], &content)
}

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    /// Decides whether the form asks for a time of day.
    pub ledger_config: LedgerConfig,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            ledger_config: state.ledger_config,
        }
    }
}

/// Renders the page for recording a transaction, defaulting to the current local date and time.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
) -> Result<Response, Error> {
    let now = local_now(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    Ok(new_transaction_view(now, state.ledger_config.record_time_of_day).into_response())
}
