//! The normalized username that identifies an account and its ledger.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// The maximum number of characters in a normalized username.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// A username that has been trimmed, had its internal whitespace collapsed to
/// single spaces, and been lower-cased.
///
/// Only ASCII letters, digits and single spaces survive validation, which
/// keeps the mapping from usernames to ledger table names one-to-one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Username(String);

impl Username {
    /// Normalize and validate `raw`.
    ///
    /// # Errors
    /// Returns [Error::InvalidUsername] if the normalized username is empty,
    /// longer than [MAX_USERNAME_LENGTH] or contains characters other than
    /// ASCII letters, digits and spaces.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if normalized.is_empty() {
            return Err(Error::InvalidUsername("username cannot be empty".to_owned()));
        }

        if normalized.chars().count() > MAX_USERNAME_LENGTH {
            return Err(Error::InvalidUsername(format!(
                "username cannot be longer than {MAX_USERNAME_LENGTH} characters"
            )));
        }

        if let Some(invalid) = normalized
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' '))
        {
            return Err(Error::InvalidUsername(format!(
                "'{invalid}' is not allowed, use only letters, digits and spaces"
            )));
        }

        Ok(Self(normalized))
    }

    /// The normalized username.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Username {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Username::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{MAX_USERNAME_LENGTH, Username};

    #[test]
    fn normalizes_case_and_whitespace() {
        let username = Username::new("  Ana   Maria ").unwrap();

        assert_eq!(username.as_str(), "ana maria");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = Username::new("\tJOAO  silva\n").unwrap();
        let twice = Username::new(once.as_str()).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_blank_username() {
        let result = Username::new("   ");

        assert!(matches!(result, Err(Error::InvalidUsername(_))));
    }

    #[test]
    fn rejects_punctuation() {
        for raw in ["ana;drop", "ana\"", "ana_b", "ana-b", "josé"] {
            let result = Username::new(raw);

            assert!(
                matches!(result, Err(Error::InvalidUsername(_))),
                "want error for {raw:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn rejects_long_username() {
        let raw = "a".repeat(MAX_USERNAME_LENGTH + 1);

        let result = Username::new(&raw);

        assert!(matches!(result, Err(Error::InvalidUsername(_))));
    }

    #[test]
    fn accepts_username_at_length_limit() {
        let raw = "a".repeat(MAX_USERNAME_LENGTH);

        assert!(Username::new(&raw).is_ok());
    }

    #[test]
    fn deserialize_normalizes() {
        let username: Username = serde_json::from_str(r#"" Ana ""#).unwrap();

        assert_eq!(username.as_str(), "ana");
    }

    #[test]
    fn deserialize_rejects_invalid() {
        let result = serde_json::from_str::<Username>(r#""a/b""#);

        assert!(result.is_err());
    }
}
