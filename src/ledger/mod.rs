//! The per-user ledger store.
//!
//! Each user's transactions live in their own table. The registry binds a
//! username to that table, the store writes rows into it and the query layer
//! reads them back.

mod payload;
mod query;
mod registry;
mod store;
mod transaction;

pub use payload::{PayloadAmount, TransactionPayload};
pub use query::list_transactions;
pub use registry::{
    LedgerTable, create_ledger_binding_table, find_ledger_table, resolve_or_create_table,
};
pub use store::{BulkInsertSummary, ImportRow, RowFailure, bulk_insert, insert_transaction};
pub use transaction::{
    Kind, NewTransaction, Transaction, TransactionId, normalize_card_type, parse_amount,
    parse_external_date_time,
};
pub(crate) use transaction::EXTERNAL_DATE_TIME_FORMAT;
