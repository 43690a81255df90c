//! Importing transactions from CSV files and exporting a ledger as CSV.

mod csv;
mod export_endpoint;
mod import_page;
mod import_transactions;
mod preview_endpoint;

pub use export_endpoint::{export_transactions, get_import_template};
pub use import_page::get_import_page;
pub use import_transactions::import_transactions;
pub use preview_endpoint::preview_import;
