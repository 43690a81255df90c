//! The JSON payload accepted by the `record_transaction` command.

use serde::Deserialize;
use time::PrimitiveDateTime;

use crate::{
    Error,
    ledger::transaction::{NewTransaction, parse_amount},
};

/// An amount given either as a JSON number or as text such as "45,00".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PayloadAmount {
    /// A JSON number.
    Number(f64),
    /// Text, which may use a decimal comma.
    Text(String),
}

fn default_kind() -> String {
    "expense".to_owned()
}

/// A transaction described in JSON, e.g.
/// `{"amount": "45,00", "bank_or_source": "Nubank", "description": "Lunch"}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionPayload {
    /// "expense" or "income", defaults to "expense".
    #[serde(default = "default_kind")]
    pub kind: String,
    /// The amount of money.
    pub amount: PayloadAmount,
    /// The card type label, defaults to empty.
    #[serde(default)]
    pub card_type: String,
    /// The bank or source of the money.
    pub bank_or_source: String,
    /// A description of what the money was for.
    pub description: String,
}

impl TransactionPayload {
    /// Parse a payload from a JSON string.
    ///
    /// # Errors
    /// Returns [Error::InvalidPayload] if `json` is not a valid payload.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|error| Error::InvalidPayload(error.to_string()))
    }

    /// Validate the payload as a transaction that happened at `occurred_at`.
    ///
    /// # Errors
    /// Returns the same validation errors as [NewTransaction::new].
    pub fn into_new_transaction(
        self,
        occurred_at: PrimitiveDateTime,
    ) -> Result<NewTransaction, Error> {
        let amount = match self.amount {
            PayloadAmount::Number(amount) => amount,
            PayloadAmount::Text(text) => parse_amount(&text)?,
        };

        NewTransaction::new(
            &self.kind,
            amount,
            &self.card_type,
            &self.bank_or_source,
            &self.description,
            occurred_at,
        )
    }
}
