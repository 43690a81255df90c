//! Defines the session that names the logged-in user and how it is kept in
//! an encrypted private cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, Username};

pub(crate) const COOKIE_SESSION: &str = "session";
/// The default duration for which session cookies are valid.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::minutes(15);

/// The user a request is made on behalf of.
///
/// The auth middleware inserts this into the request extensions, so route
/// handlers can take `Extension(session): Extension<Session>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The logged-in user.
    pub username: Username,
}

mod datetime_format {
    //! Specifies how to serialize a [time::OffsetDateTime] in a custom format that
    //! avoids serialisations with datetimes containing midnight.
    //!
    //! The default serializer for [time::OffsetDateTime] will serialize
    //! "00:00:00.000000" as "0:00:00.0" and the deserializer would error out
    //! because it expects the hours to be two digits, not one.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// Date time format for the session expiry, e.g. "2021-01-01 00:00:00.0 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// The contents of the session cookie.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Token {
    username: Username,

    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    expires_at: OffsetDateTime,
}

fn set_token(jar: PrivateCookieJar, token: &Token) -> Result<PrivateCookieJar, Error> {
    let value =
        serde_json::to_string(token).map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_SESSION, value))
            .expires(token.expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

fn get_token(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_SESSION).ok_or(Error::SessionMissing)?;

    serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::SessionMissing)
}

fn expiry_from_now(duration: Duration) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::SessionExpiry(format!("now plus {duration} overflows")))
}

/// Add a session cookie for `username` to the jar that expires `duration` from now.
///
/// # Errors
///
/// Returns:
/// - [Error::SessionExpiry] if the expiry date-time overflows.
/// - [Error::JSONSerializationError] if the session could not be serialized.
pub fn start_session(
    jar: PrivateCookieJar,
    username: &Username,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = Token {
        username: username.clone(),
        expires_at: expiry_from_now(duration)?,
    };

    set_token(jar, &token)
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn end_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the session from the jar.
///
/// # Errors
///
/// Returns [Error::SessionMissing] if the cookie is missing, cannot be read or has expired.
pub fn get_session(jar: &PrivateCookieJar) -> Result<Session, Error> {
    let token = get_token(jar)?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::SessionMissing);
    }

    Ok(Session {
        username: token.username,
    })
}

/// Push the session expiry out to `duration` from now, unless it already expires later.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::SessionMissing] if the jar has no readable session cookie.
/// - [Error::SessionExpiry] if the new expiry date-time overflows.
pub fn extend_session_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token(&jar)?;
    let new_expiry = expiry_from_now(duration)?;

    if new_expiry <= token.expires_at {
        return Ok(jar);
    }

    set_token(
        jar,
        &Token {
            username: token.username,
            expires_at: new_expiry,
        },
    )
}

#[cfg(test)]
mod token_tests {
    use time::{UtcOffset, macros::datetime};

    use crate::Username;

    use super::Token;

    #[test]
    fn serialise_token() {
        let token = Token {
            username: Username::new("ana").unwrap(),
            expires_at: datetime!(2025-12-21 03:54:00).assume_offset(UtcOffset::UTC),
        };
        let expected = r#"{"username":"ana","expires_at":"2025-12-21 03:54:00.0 +00:00:00"}"#;

        let actual = serde_json::to_string(&token).unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn deserialise_token_with_midnight_expiry() {
        let expected = Token {
            username: Username::new("ana maria").unwrap(),
            expires_at: datetime!(2025-12-21 00:00:00).assume_offset(UtcOffset::UTC),
        };
        let token_string =
            r#"{"username":"ana maria","expires_at":"2025-12-21 00:00:00.0 +00:00:00"}"#;

        let actual: Token = serde_json::from_str(token_string).unwrap();

        assert_eq!(expected, actual);
    }
}
