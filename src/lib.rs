//! Pocket Ledger is a web app for recording income and expenses and seeing
//! where the money went.
//!
//! Each user gets an isolated ledger table in a SQLite database. This library
//! provides the ledger store, the account directory, and a REST API that
//! directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod config;
mod csv_import;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod ledger;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use account::{
    PasswordHash, Username, ValidatedPassword, account_exists, create_account, verify_credentials,
};
pub use app_state::AppState;
pub use config::LedgerConfig;
pub use db::initialize as initialize_db;
pub use ledger::{
    BulkInsertSummary, ImportRow, Kind, LedgerTable, NewTransaction, RowFailure, Transaction,
    TransactionId, TransactionPayload, bulk_insert, find_ledger_table, insert_transaction,
    list_transactions, resolve_or_create_table,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::{get_local_offset, local_now};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundPage};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username is empty, too long or contains characters other than
    /// ASCII letters, digits and spaces.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// The password does not satisfy the length requirements.
    #[error("invalid password: {0}")]
    InvalidPassword(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is already registered.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// The transaction kind was not "expense" or "income".
    #[error("\"{0}\" is not a transaction kind, expected \"expense\" or \"income\"")]
    InvalidKind(String),

    /// The amount could not be parsed, or was not a positive, finite number.
    #[error("invalid amount \"{0}\", expected a number greater than zero")]
    InvalidAmount(String),

    /// A required text field was empty after trimming whitespace.
    #[error("{0} cannot be blank")]
    BlankField(&'static str),

    /// A JSON transaction payload was malformed or missing required fields.
    #[error("invalid transaction payload: {0}")]
    InvalidPayload(String),

    /// A date or date-time string did not match any of the accepted formats.
    #[error("invalid date \"{0}\"")]
    InvalidDate(String),

    /// A ledger table name read from the database is not a safe SQL identifier.
    #[error("\"{0}\" is not a valid ledger table name")]
    InvalidLedgerTable(String),

    /// The multipart form could not be parsed as a list of CSV files.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The ledger could not be written out as CSV.
    #[error("could not write the CSV export: {0}")]
    ExportError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The session cookie is missing, could not be decrypted or has expired.
    #[error("no valid session cookie")]
    SessionMissing,

    /// There was an error formatting or computing a session expiry date-time.
    #[error("invalid session expiry: {0}")]
    SessionExpiry(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 1555 occurs when a PRIMARY KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 1555 && desc.ends_with("account.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundPage.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Whether the error was caused by bad input rather than the server.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUsername(_)
                | Error::InvalidPassword(_)
                | Error::InvalidKind(_)
                | Error::InvalidAmount(_)
                | Error::BlankField(_)
                | Error::InvalidPayload(_)
                | Error::InvalidDate(_)
                | Error::InvalidCSV(_)
                | Error::NotCSV
        )
    }

    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            )
                .into_response(),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested resource could not be found.".to_owned(),
                },
            )
                .into_response(),
            error if error.is_validation_error() => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid input".to_owned(),
                    details: capitalise_first_char(&error.to_string()),
                },
            )
                .into_response(),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
                    .into_response()
            }
        }
    }
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    first.to_uppercase().chain(chars).collect()
}
