//! Defines the endpoint for recording a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, Time, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error, LedgerConfig,
    alert::Alert,
    auth::Session,
    capitalise_first_char,
    html::format_currency,
    ledger::{NewTransaction, insert_transaction, parse_amount},
};

const TIME_WITH_SECONDS_FORMAT: &[BorrowedFormatItem] =
    format_description!("[hour]:[minute]:[second]");
const TIME_FORMAT: &[BorrowedFormatItem] = format_description!("[hour]:[minute]");

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Decides whether the submitted time of day is kept.
    pub ledger_config: LedgerConfig,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            ledger_config: state.ledger_config,
        }
    }
}

/// The form data for recording a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// "expense" or "income".
    pub kind: String,
    /// The amount as typed, a decimal comma is accepted.
    pub amount: String,
    /// The card type label or token.
    #[serde(default)]
    pub card_type: String,
    pub bank_or_source: String,
    pub description: String,
    /// The date when the transaction occurred.
    pub date: Date,
    /// The time of day from an `<input type="time">`, e.g. "14:30".
    #[serde(default)]
    pub time: Option<String>,
}

fn parse_time_of_day(raw: &str) -> Result<Time, Error> {
    let trimmed = raw.trim();

    Time::parse(trimmed, TIME_WITH_SECONDS_FORMAT)
        .or_else(|_| Time::parse(trimmed, TIME_FORMAT))
        .map_err(|_| Error::InvalidDate(raw.to_owned()))
}

fn build_transaction(
    form: &TransactionForm,
    ledger_config: &LedgerConfig,
) -> Result<NewTransaction, Error> {
    let amount = parse_amount(&form.amount)?;
    let time = match form.time.as_deref().filter(|time| !time.trim().is_empty()) {
        Some(time) => Some(parse_time_of_day(time)?),
        None => None,
    };

    NewTransaction::new(
        &form.kind,
        amount,
        &form.card_type,
        &form.bank_or_source,
        &form.description,
        ledger_config.occurred_at(form.date, time),
    )
}

/// A route handler for recording a new transaction in the user's ledger.
///
/// Responds with a success alert, or an error alert explaining what was wrong.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(session): Extension<Session>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let new_transaction = match build_transaction(&form, &state.ledger_config) {
        Ok(new_transaction) => new_transaction,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match insert_transaction(&session.username, new_transaction, &connection) {
        Ok(transaction) => Alert::Success {
            message: "Transaction recorded".to_owned(),
            details: format!(
                "{} of {} at {} ({}).",
                capitalise_first_char(transaction.kind.as_str()),
                format_currency(transaction.amount),
                transaction.bank_or_source,
                transaction.description
            ),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not record transaction: {error}");
            error.into_alert_response()
        }
    }
}
