//! The page and endpoint for recording a single transaction.

mod create_endpoint;
mod new_transaction_page;

pub use create_endpoint::create_transaction_endpoint;
pub use new_transaction_page::get_new_transaction_page;
