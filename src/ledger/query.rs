//! Reads a user's transactions back out of their ledger.

use rusqlite::{Connection, Row, types::Value};
use time::PrimitiveDateTime;

use crate::{
    Error, Username,
    ledger::{
        registry::{LedgerTable, find_ledger_table},
        transaction::{Kind, STORAGE_DATE_TIME_FORMAT, Transaction, TransactionId},
    },
};

/// A ledger row before any of its columns have been interpreted.
struct RawRow {
    id: i64,
    kind: String,
    amount: Value,
    card_type: String,
    bank_or_source: String,
    description: String,
    occurred_at: String,
}

fn map_raw_row(row: &Row) -> Result<RawRow, rusqlite::Error> {
    Ok(RawRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        amount: row.get(2)?,
        card_type: row.get(3)?,
        bank_or_source: row.get(4)?,
        description: row.get(5)?,
        occurred_at: row.get(6)?,
    })
}

fn coerce_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Real(amount) => *amount,
        Value::Integer(amount) => *amount as f64,
        Value::Text(text) => text.trim().parse().ok()?,
        Value::Null | Value::Blob(_) => return None,
    };

    amount.is_finite().then_some(amount)
}

impl RawRow {
    fn into_transaction(self) -> Result<Transaction, String> {
        let amount = coerce_amount(&self.amount)
            .ok_or_else(|| format!("amount {:?} is not a number", self.amount))?;
        let kind: Kind = self.kind.parse().map_err(|error: Error| error.to_string())?;
        let occurred_at = PrimitiveDateTime::parse(&self.occurred_at, STORAGE_DATE_TIME_FORMAT)
            .map_err(|error| format!("occurred_at {:?}: {error}", self.occurred_at))?;

        Ok(Transaction {
            id: TransactionId::new(self.id),
            kind,
            amount,
            card_type: self.card_type,
            bank_or_source: self.bank_or_source,
            description: self.description,
            occurred_at,
        })
    }
}

fn table_exists(table: &LedgerTable, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_schema WHERE type = 'table' AND name = ?1)",
            (table.as_str(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get all of the transactions of `username`, newest first.
///
/// Ties on `occurred_at` are broken by the larger ID first. A user without a
/// ledger gets an empty list. Rows that cannot be interpreted are skipped and
/// logged.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidLedgerTable] if the stored ledger binding is corrupt.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn list_transactions(
    username: &Username,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let Some(table) = find_ledger_table(username, connection)? else {
        return Ok(Vec::new());
    };

    if !table_exists(&table, connection)? {
        tracing::warn!("Ledger table {table} for {username} is bound but does not exist");
        return Ok(Vec::new());
    }

    let mut statement = connection.prepare(&format!(
        "SELECT id, kind, amount, card_type, bank_or_source, description, occurred_at
        FROM {}
        ORDER BY occurred_at DESC, id DESC",
        table.quoted()
    ))?;

    let mut transactions = Vec::new();

    for raw_row in statement.query_map([], map_raw_row)? {
        let raw_row = raw_row?;
        let id = raw_row.id;

        match raw_row.into_transaction() {
            Ok(transaction) => transactions.push(transaction),
            Err(reason) => tracing::warn!("Dropping row {id} from {table}: {reason}"),
        }
    }

    Ok(transactions)
}

#[cfg(test)]
mod list_transactions_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Username,
        db::initialize,
        ledger::{NewTransaction, TransactionId, insert_transaction, resolve_or_create_table},
    };

    use super::list_transactions;

    fn get_db_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn expense(description: &str, occurred_at: time::PrimitiveDateTime) -> NewTransaction {
        NewTransaction::new("expense", 10.0, "debit", "Nubank", description, occurred_at).unwrap()
    }

    #[test]
    fn unknown_user_gets_empty_list() {
        let conn = get_db_connection();

        let transactions = list_transactions(&Username::new("nobody").unwrap(), &conn).unwrap();

        assert_eq!(transactions, vec![]);
    }

    #[test]
    fn missing_table_gets_empty_list() {
        let conn = get_db_connection();
        let username = Username::new("ana").unwrap();
        resolve_or_create_table(&username, &conn).unwrap();
        conn.execute("DROP TABLE ledger_ana", ()).unwrap();

        assert_eq!(list_transactions(&username, &conn).unwrap(), vec![]);
    }

    #[test]
    fn orders_newest_first_with_id_tie_break() {
        let conn = get_db_connection();
        let username = Username::new("ana").unwrap();
        let same_time = datetime!(2024-03-05 12:00:00);
        let oldest = insert_transaction(
            &username,
            expense("oldest", datetime!(2024-01-01 00:00:00)),
            &conn,
        )
        .unwrap();
        let first_tie = insert_transaction(&username, expense("first", same_time), &conn).unwrap();
        let second_tie =
            insert_transaction(&username, expense("second", same_time), &conn).unwrap();

        let ids: Vec<TransactionId> = list_transactions(&username, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.id)
            .collect();

        assert_eq!(ids, vec![second_tie.id, first_tie.id, oldest.id]);
    }

    #[test]
    fn coerces_integer_and_numeric_text_amounts() {
        let conn = get_db_connection();
        let username = Username::new("ana").unwrap();
        resolve_or_create_table(&username, &conn).unwrap();
        conn.execute_batch(
            "INSERT INTO ledger_ana (kind, amount, card_type, bank_or_source, description, occurred_at)
            VALUES ('expense', CAST(7 AS INTEGER), 'debit', 'Nubank', 'int', '2024-03-05 10:00:00');
            INSERT INTO ledger_ana (kind, amount, card_type, bank_or_source, description, occurred_at)
            VALUES ('income', '12.5', 'debit', 'Nubank', 'text', '2024-03-04 10:00:00');",
        )
        .unwrap();

        let amounts: Vec<f64> = list_transactions(&username, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.amount)
            .collect();

        assert_eq!(amounts, vec![7.0, 12.5]);
    }

    #[test]
    fn drops_corrupt_rows() {
        let conn = get_db_connection();
        let username = Username::new("ana").unwrap();
        let good = insert_transaction(
            &username,
            expense("good", datetime!(2024-03-05 12:00:00)),
            &conn,
        )
        .unwrap();
        conn.execute_batch(
            "INSERT INTO ledger_ana (kind, amount, card_type, bank_or_source, description, occurred_at)
            VALUES ('expense', 'lots', 'debit', 'Nubank', 'bad amount', '2024-03-06 10:00:00');
            INSERT INTO ledger_ana (kind, amount, card_type, bank_or_source, description, occurred_at)
            VALUES ('gift', 1.0, 'debit', 'Nubank', 'bad kind', '2024-03-06 10:00:00');
            INSERT INTO ledger_ana (kind, amount, card_type, bank_or_source, description, occurred_at)
            VALUES ('income', 1.0, 'debit', 'Nubank', 'bad date', 'yesterday');",
        )
        .unwrap();

        let transactions = list_transactions(&username, &conn).unwrap();

        assert_eq!(transactions, vec![good]);
    }
}
