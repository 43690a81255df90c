//! Code for creating the account table, registering accounts and checking credentials.

use rusqlite::{Connection, OptionalExtension};

use crate::{Error, PasswordHash, Username};

/// A hash that is verified when the username is unknown so that a failed
/// log-in costs one bcrypt verification either way.
const DUMMY_PASSWORD_HASH: &str = "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm";

/// Create the account table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Register `username` with `password_hash`.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateUsername] if the username is already registered.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_account(
    username: &Username,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO account (username, password_hash) VALUES (?1, ?2)",
        (username.as_str(), password_hash.to_string()),
    )?;

    tracing::info!("Created account for {username}");

    Ok(())
}

/// Whether `username` has a registered account.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn account_exists(username: &Username, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM account WHERE username = ?1)",
            (username.as_str(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// The stored password hash for `username`, or `None` if there is no such account.
///
/// Pair with [check_password] so that a shared connection is only held for the
/// lookup and not for the bcrypt verification.
///
/// # Errors
///
/// Returns a [Error::SqlError] if the account could not be read.
pub fn get_password_hash(
    username: &Username,
    connection: &Connection,
) -> Result<Option<PasswordHash>, Error> {
    let stored_hash: Option<String> = connection
        .query_row(
            "SELECT password_hash FROM account WHERE username = ?1",
            (username.as_str(),),
            |row| row.get(0),
        )
        .optional()?;

    Ok(stored_hash.map(|hash| PasswordHash::new_unchecked(&hash)))
}

/// Check `raw_password` against a hash from [get_password_hash].
///
/// Returns `false` for a missing account, a wrong password or a stored hash
/// that cannot be parsed. A missing account still costs one verification.
pub fn check_password(stored_hash: Option<&PasswordHash>, raw_password: &str) -> bool {
    let Some(stored_hash) = stored_hash else {
        let _ = PasswordHash::new_unchecked(DUMMY_PASSWORD_HASH).verify(raw_password);
        return false;
    };

    stored_hash.verify(raw_password).unwrap_or_else(|error| {
        tracing::warn!("Stored password hash could not be verified: {error}");
        false
    })
}

/// Check `raw_password` against the stored hash for `username`.
///
/// Returns `Ok(false)` for an unknown user, a wrong password or a stored hash
/// that cannot be parsed.
///
/// # Errors
///
/// Returns a [Error::SqlError] if the account could not be read.
pub fn verify_credentials(
    username: &Username,
    raw_password: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let stored_hash = get_password_hash(username, connection)?;

    Ok(check_password(stored_hash.as_ref(), raw_password))
}
