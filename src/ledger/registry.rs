//! Maps each username to the table that holds that user's transactions.

use std::fmt::Display;

use rusqlite::{Connection, ErrorCode, OptionalExtension};

use crate::{Error, Username, account::MAX_USERNAME_LENGTH};

const LEDGER_TABLE_PREFIX: &str = "ledger_";

/// The name of a per-user ledger table.
///
/// A `LedgerTable` is always a safe SQL identifier: the prefix `ledger_`
/// followed by lower-case ASCII letters, digits and underscores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTable(String);

impl LedgerTable {
    /// Derive the table name for `username`.
    pub fn for_username(username: &Username) -> Self {
        Self(format!(
            "{LEDGER_TABLE_PREFIX}{}",
            username.as_str().replace(' ', "_")
        ))
    }

    /// Validate a table name read back from the database.
    ///
    /// # Errors
    /// Returns [Error::InvalidLedgerTable] if `name` is not a ledger table name.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let Some(suffix) = name.strip_prefix(LEDGER_TABLE_PREFIX) else {
            return Err(Error::InvalidLedgerTable(name.to_owned()));
        };

        let is_valid = !suffix.is_empty()
            && suffix.len() <= MAX_USERNAME_LENGTH
            && suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if is_valid {
            Ok(Self(name.to_owned()))
        } else {
            Err(Error::InvalidLedgerTable(name.to_owned()))
        }
    }

    /// The bare table name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The table name quoted for direct use in SQL.
    pub(crate) fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl Display for LedgerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Create the table that binds usernames to ledger tables.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_ledger_binding_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_ledger (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                ledger_table TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

fn create_ledger_table(table: &LedgerTable, connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                card_type TEXT NOT NULL,
                bank_or_source TEXT NOT NULL,
                description TEXT NOT NULL,
                occurred_at TEXT NOT NULL
                )",
            table.quoted()
        ),
        (),
    )?;

    Ok(())
}

/// Get the ledger table bound to `username` without creating anything.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidLedgerTable] if the stored name is not a safe identifier.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn find_ledger_table(
    username: &Username,
    connection: &Connection,
) -> Result<Option<LedgerTable>, Error> {
    let name: Option<String> = connection
        .query_row(
            "SELECT ledger_table FROM account_ledger WHERE username = ?1",
            (username.as_str(),),
            |row| row.get(0),
        )
        .optional()?;

    name.map(|name| LedgerTable::parse(&name)).transpose()
}

/// Get the ledger table bound to `username`, creating the binding and the
/// table on first use.
///
/// The binding and the table are created in one SQL transaction, so a failed
/// table creation leaves no binding behind. If another connection creates the
/// binding first, the existing binding is returned.
///
/// **Note**: `connection` must not already be inside a transaction.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidLedgerTable] if the stored name is not a safe identifier.
/// - [Error::SqlError] if the binding or the table could not be created.
pub fn resolve_or_create_table(
    username: &Username,
    connection: &Connection,
) -> Result<LedgerTable, Error> {
    if let Some(table) = find_ledger_table(username, connection)? {
        return Ok(table);
    }

    let table = LedgerTable::for_username(username);
    let transaction = connection.unchecked_transaction()?;

    let insert_result = transaction.execute(
        "INSERT INTO account_ledger (username, ledger_table) VALUES (?1, ?2)",
        (username.as_str(), table.as_str()),
    );

    match insert_result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(error, _))
            if error.code == ErrorCode::ConstraintViolation =>
        {
            tracing::debug!("Ledger binding for {username} was created concurrently");
            drop(transaction);

            return find_ledger_table(username, connection)?.ok_or(Error::NotFound);
        }
        Err(error) => return Err(error.into()),
    }

    create_ledger_table(&table, &transaction)
        .inspect_err(|error| tracing::error!("Could not create ledger table {table}: {error}"))?;
    transaction.commit()?;

    tracing::info!("Created ledger table {table} for {username}");

    Ok(table)
}

#[cfg(test)]
mod ledger_registry_tests {
    use rusqlite::Connection;

    use crate::{Error, Username, db::initialize};

    use super::{LedgerTable, find_ledger_table, resolve_or_create_table};

    fn get_db_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn table_exists(name: &str, conn: &Connection) -> bool {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_schema WHERE type = 'table' AND name = ?1)",
            (name,),
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn table_name_replaces_spaces() {
        let username = Username::new("Ana Maria").unwrap();

        assert_eq!(
            LedgerTable::for_username(&username).as_str(),
            "ledger_ana_maria"
        );
    }

    #[test]
    fn parse_rejects_unsafe_names() {
        for name in ["account", "ledger_", "ledger_a\"b", "ledger_A", "ledger_a b"] {
            assert_eq!(
                LedgerTable::parse(name),
                Err(Error::InvalidLedgerTable(name.to_owned())),
                "want {name:?} to be rejected"
            );
        }
    }

    #[test]
    fn resolve_creates_binding_and_table() {
        let conn = get_db_connection();
        let username = Username::new("ana").unwrap();

        let table = resolve_or_create_table(&username, &conn).unwrap();

        assert_eq!(table.as_str(), "ledger_ana");
        assert!(table_exists("ledger_ana", &conn));
        assert_eq!(find_ledger_table(&username, &conn), Ok(Some(table)));
    }

    #[test]
    fn resolve_is_idempotent() {
        let conn = get_db_connection();
        let username = Username::new("ana").unwrap();

        let first = resolve_or_create_table(&username, &conn).unwrap();
        let second = resolve_or_create_table(&username, &conn).unwrap();

        assert_eq!(first, second);
        let binding_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM account_ledger", [], |row| row.get(0))
            .unwrap();
        assert_eq!(binding_count, 1);
    }

    #[test]
    fn find_does_not_create_binding() {
        let conn = get_db_connection();
        let username = Username::new("ana").unwrap();

        assert_eq!(find_ledger_table(&username, &conn), Ok(None));
        assert!(!table_exists("ledger_ana", &conn));
    }

    #[test]
    fn failed_table_creation_leaves_no_binding() {
        let conn = get_db_connection();
        conn.execute_batch(
            "CREATE TABLE dummy (x INTEGER);
            CREATE INDEX ledger_ana ON dummy(x);",
        )
        .unwrap();
        let username = Username::new("ana").unwrap();

        let result = resolve_or_create_table(&username, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))));
        assert_eq!(find_ledger_table(&username, &conn), Ok(None));
    }

    #[test]
    fn corrupt_binding_is_rejected() {
        let conn = get_db_connection();
        conn.execute(
            "INSERT INTO account_ledger (username, ledger_table) VALUES ('ana', 'account; --')",
            (),
        )
        .unwrap();

        let result = find_ledger_table(&Username::new("ana").unwrap(), &conn);

        assert_eq!(
            result,
            Err(Error::InvalidLedgerTable("account; --".to_owned()))
        );
    }
}
