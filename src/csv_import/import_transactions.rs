use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::Session,
    csv_import::csv::parse_import_csv,
    ledger::{ImportRow, RowFailure, bulk_insert},
};

/// How many failed rows are listed in the alert after an import.
const MAX_REPORTED_FAILURES: usize = 5;

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A parsed upload, kept so failures can name the file they came from.
pub(super) struct UploadedFile {
    pub(super) file_name: String,
    pub(super) rows: Vec<ImportRow>,
}

/// Route handler for importing transactions from CSV files.
///
/// Every file is parsed before anything is written, so a file with the wrong
/// header rejects the whole upload. Each file is then written as its own batch
/// with [bulk_insert], skipping rows that fail.
pub async fn import_transactions(
    State(state): State<ImportState>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let start_time = std::time::Instant::now();
    let files = read_uploaded_files(&mut multipart).await?;
    let row_count: usize = files.iter().map(|file| file.rows.len()).sum();

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_alert_response()
    })?;

    let mut imported = 0;
    let mut failures = Vec::new();

    for file in files {
        let summary = bulk_insert(&session.username, file.rows, &connection)
            .inspect_err(|error| {
                tracing::error!("Failed to import '{}': {error}", file.file_name)
            })
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Import failed".to_owned(),
                        details: format!(
                            "{imported} transactions were imported before {} could be written, \
                            please try again later.",
                            file.file_name
                        ),
                    }
                    .into_html(),
                )
                    .into_response()
            })?;

        imported += summary.success_count();
        failures.extend(
            summary
                .failures
                .into_iter()
                .map(|failure| (file.file_name.clone(), failure)),
        );
    }

    let duration = start_time.elapsed();
    tracing::info!(
        "Imported {imported} of {row_count} rows for {} in {:.1}ms",
        session.username,
        duration.as_millis()
    );

    let details = summary_details(imported, &failures);

    if imported == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Alert::Error {
                message: "Nothing was imported".to_owned(),
                details,
            }
            .into_html(),
        )
            .into_response());
    }

    Ok((
        StatusCode::CREATED,
        Alert::Success {
            message: "Import complete".to_owned(),
            details,
        }
        .into_html(),
    )
        .into_response())
}

/// Read and parse every CSV file in `multipart`.
///
/// The whole upload is rejected with an alert if any file is not a CSV, has
/// the wrong header, or if there are no rows at all.
pub(super) async fn read_uploaded_files(
    multipart: &mut Multipart,
) -> Result<Vec<UploadedFile>, Response> {
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                tracing::error!("Could not read multipart form: {error}");
                return Err(bad_request("Could not read the uploaded files."));
            }
        };

        let (file_name, csv_data) = parse_multipart_field(field)
            .await
            .map_err(|error| match error {
                Error::NotCSV => bad_request("File type must be CSV."),
                error => {
                    tracing::error!("Failed to parse multipart field: {}", error);
                    error.into_alert_response()
                }
            })?;

        let rows = parse_import_csv(&csv_data)
            .inspect_err(|error| tracing::debug!("Failed to parse CSV '{file_name}': {error}"))
            .map_err(|error| {
                (
                    StatusCode::BAD_REQUEST,
                    Alert::Error {
                        message: format!("Failed to parse {file_name}"),
                        details: error.to_string(),
                    }
                    .into_html(),
                )
                    .into_response()
            })?;

        files.push(UploadedFile { file_name, rows });
    }

    if files.iter().all(|file| file.rows.is_empty()) {
        return Err(bad_request("No transactions found in the uploaded files."));
    }

    Ok(files)

}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Alert::ErrorSimple {
            message: message.to_owned(),
        }
        .into_html(),
    )
        .into_response()
}

fn summary_details(imported: usize, failures: &[(String, RowFailure)]) -> String {
    let mut details = format!(
        "Imported {imported} transactions, skipped {} rows.",
        failures.len()
    );

    for (file_name, failure) in failures.iter().take(MAX_REPORTED_FAILURES) {
        details.push_str(&format!(
            "\n{file_name} line {}: {}",
            failure.line, failure.reason
        ));
    }

    if failures.len() > MAX_REPORTED_FAILURES {
        details.push_str(&format!(
            "\n...and {} more.",
            failures.len() - MAX_REPORTED_FAILURES
        ));
    }

    details
}

async fn parse_multipart_field(field: Field<'_>) -> Result<(String, String), Error> {
    if field.content_type() != Some("text/csv") {
        return Err(Error::NotCSV);
    }

    let file_name = match field.file_name() {
        Some(file_name) => file_name.to_owned(),
        None => {
            tracing::error!("Could not get file name from multipart form field: {field:#?}");
            return Err(Error::MultipartError(
                "Could not get file name from multipart form field".to_owned(),
            ));
        }
    };
    let data = match field.text().await {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("Could not read data from multipart form field: {error}");
            return Err(Error::MultipartError(
                "Could not read data from multipart form field.".to_owned(),
            ));
        }
    };

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok((file_name, data))
}
