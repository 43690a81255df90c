//! CSV downloads: the user's whole ledger and an empty import template.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, Username,
    auth::Session,
    csv_import::csv::{template_csv, write_export_csv},
    ledger::list_transactions,
};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// The state needed for exporting a ledger.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn csv_attachment(file_name: &str, body: String) -> Response {
    (
        [
            (CONTENT_TYPE, CSV_CONTENT_TYPE.to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Route handler that downloads the logged-in user's transactions as CSV.
pub async fn export_transactions(
    State(state): State<ExportState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let transactions = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        list_transactions(&session.username, &connection)?
    };

    let body = write_export_csv(&transactions)?;
    tracing::debug!(
        "Exporting {} transactions for {}",
        transactions.len(),
        session.username
    );

    Ok(csv_attachment(&export_file_name(&session.username), body))
}

/// The download name for a user's export, e.g. "transactions_ana_maria.csv".
fn export_file_name(username: &Username) -> String {
    format!("transactions_{}.csv", username.as_str().replace(' ', "_"))
}

/// Route handler that downloads a CSV template for importing transactions.
pub async fn get_import_template() -> Result<Response, Error> {
    Ok(csv_attachment("transactions_template.csv", template_csv()?))
}
