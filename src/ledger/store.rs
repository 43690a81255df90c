//! Writes transactions into a user's ledger, one at a time or in bulk.

use rusqlite::Connection;

use crate::{
    Error, Username,
    ledger::{
        registry::{LedgerTable, resolve_or_create_table},
        transaction::{
            NewTransaction, STORAGE_DATE_TIME_FORMAT, Transaction, TransactionId, parse_amount,
            parse_external_date_time,
        },
    },
};

/// Append `transaction` to the ledger of `username`, creating the ledger if needed.
///
/// The row is written by a single statement, so it is either stored in full or not at all.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidLedgerTable] if the stored ledger binding is corrupt.
/// - [Error::SqlError] if the ledger could not be created or the row could not be written.
pub fn insert_transaction(
    username: &Username,
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let table = resolve_or_create_table(username, connection)?;

    insert_into(&table, &transaction, connection)
}

fn insert_into(
    table: &LedgerTable,
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let occurred_at = transaction
        .occurred_at()
        .format(STORAGE_DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;

    let id = connection.query_row(
        &format!(
            "INSERT INTO {} (kind, amount, card_type, bank_or_source, description, occurred_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id",
            table.quoted()
        ),
        (
            transaction.kind().as_str(),
            transaction.amount(),
            transaction.card_type(),
            transaction.bank_or_source(),
            transaction.description(),
            &occurred_at,
        ),
        |row| row.get(0),
    )?;

    Ok(Transaction {
        id: TransactionId::new(id),
        kind: transaction.kind(),
        amount: transaction.amount(),
        card_type: transaction.card_type().to_owned(),
        bank_or_source: transaction.bank_or_source().to_owned(),
        description: transaction.description().to_owned(),
        occurred_at: transaction.occurred_at(),
    })
}

/// One unparsed row of a bulk import.
///
/// Every field is kept as the raw text so that parsing failures can be
/// reported per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    /// The line number in the source file, used in failure reports.
    pub line: u64,
    /// "expense" or "income", in any case.
    pub kind: String,
    /// A positive number, optionally with a decimal comma.
    pub amount: String,
    /// A card type label, normalized on insert.
    pub card_type: String,
    /// The bank or source of the money.
    pub bank_or_source: String,
    /// A description of what the money was for.
    pub description: String,
    /// "DD/MM/YYYY HH:MM:SS" or "DD/MM/YYYY".
    pub occurred_at: String,
}

impl ImportRow {
    pub(crate) fn parse(&self) -> Result<NewTransaction, Error> {
        let amount = parse_amount(&self.amount)?;
        let occurred_at = parse_external_date_time(&self.occurred_at)?;

        NewTransaction::new(
            &self.kind,
            amount,
            &self.card_type,
            &self.bank_or_source,
            &self.description,
            occurred_at,
        )
    }
}

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// The line number of the row in the source file.
    pub line: u64,
    /// Why the row was rejected.
    pub reason: String,
}

/// The outcome of [bulk_insert].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkInsertSummary {
    /// The transactions that were written, in input order.
    pub inserted: Vec<Transaction>,
    /// The rows that were skipped, in input order.
    pub failures: Vec<RowFailure>,
}

impl BulkInsertSummary {
    /// The number of rows that were written.
    pub fn success_count(&self) -> usize {
        self.inserted.len()
    }

    /// The number of rows that were skipped.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Import many rows into the ledger of `username`.
///
/// Each row is parsed, validated and written on its own savepoint. A row that
/// fails is recorded in [BulkInsertSummary::failures] and the batch carries on.
/// The batch is committed if at least one row was written, otherwise it is
/// rolled back.
///
/// **Note**: `connection` must not already be inside a transaction.
///
/// # Errors
///
/// Returns an error only if the ledger could not be resolved or the batch
/// transaction could not be started or finished. Row failures are not errors.
pub fn bulk_insert(
    username: &Username,
    rows: Vec<ImportRow>,
    connection: &Connection,
) -> Result<BulkInsertSummary, Error> {
    let table = resolve_or_create_table(username, connection)?;
    let mut transaction = connection.unchecked_transaction()?;
    let mut summary = BulkInsertSummary::default();

    for row in rows {
        let result = row.parse().and_then(|new_transaction| {
            let savepoint = transaction.savepoint()?;
            let inserted = insert_into(&table, &new_transaction, &savepoint)?;
            savepoint.commit()?;

            Ok(inserted)
        });

        match result {
            Ok(inserted) => summary.inserted.push(inserted),
            Err(error) => {
                tracing::warn!("Skipping row on line {} for {username}: {error}", row.line);
                summary.failures.push(RowFailure {
                    line: row.line,
                    reason: error.to_string(),
                });
            }
        }
    }

    if summary.inserted.is_empty() {
        transaction.rollback()?;
    } else {
        transaction.commit()?;
    }

    tracing::info!(
        "Imported {} rows into {table}, skipped {}",
        summary.success_count(),
        summary.failure_count()
    );

    Ok(summary)
}
