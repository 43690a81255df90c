//! The transaction types stored in a ledger and the normalization applied
//! before anything is written.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{
    PrimitiveDateTime, Time, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::Error;

/// How `occurred_at` is stored in a ledger table, e.g. "2024-03-05 14:30:00".
pub(crate) const STORAGE_DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Date-time format written to CSV files, e.g. "05/03/2024 14:30:00".
pub(crate) const EXTERNAL_DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day]/[month]/[year] [hour]:[minute]:[second]");

/// Date-time format read from CSV files. Leading zeros are optional, so both
/// "05/03/2024 09:05:00" and "5/3/2024 9:05:00" parse.
const IMPORT_DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[day padding:none]/[month padding:none]/[year] [hour padding:none]:[minute padding:none]:[second padding:none]"
);

/// Date-only format read from CSV files, e.g. "05/03/2024" or "5/3/2024".
const IMPORT_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day padding:none]/[month padding:none]/[year]");

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Money spent.
    Expense,
    /// Money received.
    Income,
}

impl Kind {
    /// The lower-case name stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Expense => "expense",
            Kind::Income => "income",
        }
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(Kind::Expense),
            "income" => Ok(Kind::Income),
            _ => Err(Error::InvalidKind(s.to_owned())),
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize a card type label to a token, e.g. "Other/Cash/Pix" becomes "other_cash_pix".
pub fn normalize_card_type(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '/'], "_")
}

/// Parse an amount, accepting a lone decimal comma as in "45,00".
///
/// The sign is checked later by [NewTransaction::new].
///
/// # Errors
/// Returns [Error::InvalidAmount] if `raw` is not a number.
pub fn parse_amount(raw: &str) -> Result<f64, Error> {
    let trimmed = raw.trim();
    let normalized = if !trimmed.contains('.') && trimmed.matches(',').count() == 1 {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_owned()
    };

    normalized
        .parse::<f64>()
        .map_err(|_| Error::InvalidAmount(raw.to_owned()))
}

/// Parse a CSV date-time, trying "DD/MM/YYYY HH:MM:SS" then "DD/MM/YYYY".
///
/// A date without a time is taken to be at midnight.
///
/// # Errors
/// Returns [Error::InvalidDate] if neither format matches.
pub fn parse_external_date_time(raw: &str) -> Result<PrimitiveDateTime, Error> {
    let trimmed = raw.trim();

    if let Ok(date_time) = PrimitiveDateTime::parse(trimmed, IMPORT_DATE_TIME_FORMAT) {
        return Ok(date_time);
    }

    time::Date::parse(trimmed, IMPORT_DATE_FORMAT)
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
        .map_err(|_| Error::InvalidDate(raw.to_owned()))
}

/// A validated transaction that has not been written yet.
///
/// Use [NewTransaction::new] to construct one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    kind: Kind,
    amount: f64,
    card_type: String,
    bank_or_source: String,
    description: String,
    occurred_at: PrimitiveDateTime,
}

impl NewTransaction {
    /// Normalize and validate the fields of a transaction.
    ///
    /// `kind` is matched case-insensitively, `card_type` is normalized with
    /// [normalize_card_type] and the text fields are trimmed.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::InvalidKind] if `kind` is not "expense" or "income".
    /// - [Error::InvalidAmount] if `amount` is not finite or not greater than zero.
    /// - [Error::BlankField] if `bank_or_source` or `description` is blank.
    pub fn new(
        kind: &str,
        amount: f64,
        card_type: &str,
        bank_or_source: &str,
        description: &str,
        occurred_at: PrimitiveDateTime,
    ) -> Result<Self, Error> {
        let kind: Kind = kind.parse()?;

        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidAmount(amount.to_string()));
        }

        let bank_or_source = bank_or_source.trim();
        if bank_or_source.is_empty() {
            return Err(Error::BlankField("bank or source"));
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(Error::BlankField("description"));
        }

        Ok(Self {
            kind,
            amount,
            card_type: normalize_card_type(card_type),
            bank_or_source: bank_or_source.to_owned(),
            description: description.to_owned(),
            occurred_at,
        })
    }

    /// Whether the transaction is an expense or income.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The amount of money, always greater than zero.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The normalized card type token.
    pub fn card_type(&self) -> &str {
        &self.card_type
    }

    /// The bank or source of the money.
    pub fn bank_or_source(&self) -> &str {
        &self.bank_or_source
    }

    /// A description of what the money was for.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// When the transaction happened.
    pub fn occurred_at(&self) -> PrimitiveDateTime {
        self.occurred_at
    }
}

/// The store-assigned ID of a transaction within one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(i64);

impl TransactionId {
    /// Create a new transaction ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A transaction read back from a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID assigned when the transaction was written.
    pub id: TransactionId,
    /// Whether the transaction is an expense or income.
    pub kind: Kind,
    /// The amount of money.
    pub amount: f64,
    /// The normalized card type token.
    pub card_type: String,
    /// The bank or source of the money.
    pub bank_or_source: String,
    /// A description of what the money was for.
    pub description: String,
    /// When the transaction happened.
    pub occurred_at: PrimitiveDateTime,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::Error;

    use super::{
        Kind, NewTransaction, normalize_card_type, parse_amount, parse_external_date_time,
    };

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(" Expense ".parse::<Kind>(), Ok(Kind::Expense));
        assert_eq!("INCOME".parse::<Kind>(), Ok(Kind::Income));
    }

    #[test]
    fn kind_rejects_unknown() {
        assert_eq!(
            "transfer".parse::<Kind>(),
            Err(Error::InvalidKind("transfer".to_owned()))
        );
    }

    #[test]
    fn card_type_normalization() {
        assert_eq!(normalize_card_type("Other/Cash/Pix"), "other_cash_pix");
        assert_eq!(normalize_card_type(" Debit "), "debit");
        assert_eq!(normalize_card_type("Credit card"), "credit_card");
    }

    #[test]
    fn card_type_normalization_is_idempotent() {
        for raw in ["Other/Cash/Pix", "  Meal Voucher ", "debit"] {
            let once = normalize_card_type(raw);

            assert_eq!(normalize_card_type(&once), once);
        }
    }

    #[test]
    fn parse_amount_accepts_decimal_comma() {
        assert_eq!(parse_amount("45,00"), Ok(45.0));
        assert_eq!(parse_amount(" 12.5 "), Ok(12.5));
    }

    #[test]
    fn parse_amount_rejects_text() {
        assert_eq!(
            parse_amount("ten"),
            Err(Error::InvalidAmount("ten".to_owned()))
        );
        assert!(parse_amount("1,2,3").is_err());
    }

    #[test]
    fn parse_date_time_prefers_full_format() {
        assert_eq!(
            parse_external_date_time("05/03/2024 14:30:15"),
            Ok(datetime!(2024-03-05 14:30:15))
        );
    }

    #[test]
    fn parse_date_only_is_midnight() {
        assert_eq!(
            parse_external_date_time("05/03/2024"),
            Ok(datetime!(2024-03-05 00:00:00))
        );
    }

    #[test]
    fn parse_date_accepts_missing_leading_zeros() {
        assert_eq!(
            parse_external_date_time("5/3/2024"),
            Ok(datetime!(2024-03-05 00:00:00))
        );
        assert_eq!(
            parse_external_date_time("05/03/2024 9:05:00"),
            Ok(datetime!(2024-03-05 09:05:00))
        );
        assert_eq!(
            parse_external_date_time("5/3/2024 9:5:7"),
            Ok(datetime!(2024-03-05 09:05:07))
        );
    }

    #[test]
    fn parse_date_time_rejects_other_formats() {
        for raw in ["not-a-date", "2024-03-05", "31/02/2024"] {
            assert_eq!(
                parse_external_date_time(raw),
                Err(Error::InvalidDate(raw.to_owned()))
            );
        }
    }

    #[test]
    fn new_transaction_normalizes_fields() {
        let transaction = NewTransaction::new(
            "Expense",
            12.5,
            "Other/Cash/Pix",
            "  Nubank ",
            " Lunch ",
            datetime!(2024-03-05 12:00:00),
        )
        .unwrap();

        assert_eq!(transaction.kind(), Kind::Expense);
        assert_eq!(transaction.card_type(), "other_cash_pix");
        assert_eq!(transaction.bank_or_source(), "Nubank");
        assert_eq!(transaction.description(), "Lunch");
    }

    #[test]
    fn new_transaction_rejects_non_positive_amounts() {
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = NewTransaction::new(
                "expense",
                amount,
                "debit",
                "Nubank",
                "Lunch",
                datetime!(2024-03-05 12:00:00),
            );

            assert!(
                matches!(result, Err(Error::InvalidAmount(_))),
                "want invalid amount error for {amount}, got {result:?}"
            );
        }
    }

    #[test]
    fn new_transaction_rejects_blank_fields() {
        let blank_description = NewTransaction::new(
            "income",
            10.0,
            "",
            "Employer",
            "   ",
            datetime!(2024-03-05 12:00:00),
        );
        let blank_source = NewTransaction::new(
            "income",
            10.0,
            "",
            "",
            "Salary",
            datetime!(2024-03-05 12:00:00),
        );

        assert_eq!(blank_description, Err(Error::BlankField("description")));
        assert_eq!(blank_source, Err(Error::BlankField("bank or source")));
    }
}
