//! Reads and writes the ledger CSV format.
//!
//! The format has the header `kind,amount,card_type,bank_or_source,description,occurred_at`
//! and one transaction per record. Import accepts `occurred_at` as
//! "DD/MM/YYYY HH:MM:SS" or "DD/MM/YYYY", export always writes the former.

use csv::{ReaderBuilder, StringRecord, Writer};

use crate::{
    Error,
    ledger::{EXTERNAL_DATE_TIME_FORMAT, ImportRow, Transaction},
};

/// The column names, in order.
pub const CSV_COLUMNS: [&str; 6] = [
    "kind",
    "amount",
    "card_type",
    "bank_or_source",
    "description",
    "occurred_at",
];

const TEMPLATE_EXAMPLE_ROW: [&str; 6] = [
    "expense",
    "45,50",
    "Debit",
    "Nubank",
    "Groceries",
    "05/03/2024 14:30:00",
];

/// Parse an uploaded CSV file into unparsed import rows.
///
/// Records with missing fields are kept with the missing fields left empty,
/// so they are reported as failed rows rather than silently dropped.
///
/// # Errors
/// Returns [Error::InvalidCSV] if the header does not match [CSV_COLUMNS]
/// or the file is not valid CSV.
pub fn parse_import_csv(text: &str) -> Result<Vec<ImportRow>, Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;
    check_header(header)?;

    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|error| Error::InvalidCSV(error.to_string()))?;
        // Line 1 is the header.
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(index as u64 + 2);
        let field = |column: usize| record.get(column).unwrap_or_default().to_owned();

        rows.push(ImportRow {
            line,
            kind: field(0),
            amount: field(1),
            card_type: field(2),
            bank_or_source: field(3),
            description: field(4),
            occurred_at: field(5),
        });
    }

    Ok(rows)
}

fn check_header(header: &StringRecord) -> Result<(), Error> {
    let got: Vec<&str> = header.iter().map(str::trim).collect();

    if got != CSV_COLUMNS {
        return Err(Error::InvalidCSV(format!(
            "expected the header \"{}\", got \"{}\"",
            CSV_COLUMNS.join(","),
            got.join(",")
        )));
    }

    Ok(())
}

/// Write `transactions` as CSV in the same format [parse_import_csv] reads.
///
/// # Errors
/// Returns [Error::ExportError] if a record could not be written.
pub fn write_export_csv(transactions: &[Transaction]) -> Result<String, Error> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS).map_err(export_error)?;

    for transaction in transactions {
        let occurred_at = transaction
            .occurred_at
            .format(EXTERNAL_DATE_TIME_FORMAT)
            .map_err(|error| Error::ExportError(error.to_string()))?;
        let amount = transaction.amount.to_string();

        writer
            .write_record([
                transaction.kind.as_str(),
                amount.as_str(),
                transaction.card_type.as_str(),
                transaction.bank_or_source.as_str(),
                transaction.description.as_str(),
                occurred_at.as_str(),
            ])
            .map_err(export_error)?;
    }

    into_string(writer)
}

/// A CSV file with the header and one example row.
///
/// # Errors
/// Returns [Error::ExportError] if the template could not be written.
pub fn template_csv() -> Result<String, Error> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS).map_err(export_error)?;
    writer
        .write_record(TEMPLATE_EXAMPLE_ROW)
        .map_err(export_error)?;

    into_string(writer)
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String, Error> {
    let bytes = writer
        .into_inner()
        .map_err(|error| Error::ExportError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::ExportError(error.to_string()))
}

fn export_error(error: csv::Error) -> Error {
    Error::ExportError(error.to_string())
}
