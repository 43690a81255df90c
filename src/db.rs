//! Creates the tables shared by every user.
//!
//! Ledger tables are created per user on demand, see [crate::ledger].

use rusqlite::{Connection, TransactionBehavior, Transaction as SqlTransaction};

use crate::{Error, account::create_account_table, ledger::create_ledger_binding_table};

/// Create the account and ledger binding tables if they do not exist.
///
/// # Errors
/// Returns an [Error::SqlError] if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_ledger_binding_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_schema
                WHERE type = 'table' AND name IN ('account', 'account_ledger')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 2);
    }
}
