//! The JSON body for creating a transaction and its validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{
    Error,
    auth::{UserID, authorize_user, deserialize_user_id},
    transaction::{Transaction, TransactionBuilder, TransactionType},
    validation::{optional_text, required_text},
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The JSON body of a request to create a transaction.
///
/// All fields are optional so that missing values can be reported as
/// validation errors.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The ID of the user the transaction is for, as a number or numeric string.
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<i64>,
    /// What the money was for.
    pub description: Option<String>,
    /// The category of the transaction.
    pub category: Option<String>,
    /// A positive number, or a string holding one.
    pub amount: Option<Value>,
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// A date in the form `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date: Option<String>,
}

impl TransactionForm {
    /// Check the form on behalf of `session_user_id` and turn it into a builder.
    ///
    /// # Errors
    ///
    /// Returns an [Error::MissingField] for the first absent required field,
    /// [Error::Forbidden] if the form is for another user, or
    /// [Error::InvalidField] if a value cannot be interpreted.
    pub fn validate(self, session_user_id: UserID) -> Result<TransactionBuilder, Error> {
        let user_id = authorize_user(session_user_id, self.user_id)?;
        let description = required_text(self.description, "description")?;
        let amount = parse_amount(self.amount)?;
        let transaction_type = required_text(self.transaction_type, "type")?;
        let transaction_type = TransactionType::parse(&transaction_type).ok_or_else(|| {
            Error::InvalidField(
                "type",
                format!("expected income or expense, got {transaction_type:?}"),
            )
        })?;
        let date = parse_date(&required_text(self.date, "date")?)?;

        Ok(
            Transaction::build(user_id, amount, transaction_type, &description)
                .category(&optional_text(self.category))
                .date(date),
        )
    }
}

/// Parse an amount given either as a JSON number or a numeric string.
///
/// # Errors
///
/// Returns [Error::MissingField] if there is no amount, or
/// [Error::InvalidField] if it is not a positive, finite number.
fn parse_amount(value: Option<Value>) -> Result<f64, Error> {
    let amount = match value {
        None | Some(Value::Null) => return Err(Error::MissingField("amount")),
        Some(Value::String(text)) if text.trim().is_empty() => {
            return Err(Error::MissingField("amount"));
        }
        Some(Value::String(text)) => text.trim().parse::<f64>().map_err(|_| {
            Error::InvalidField("amount", format!("{text:?} is not a number"))
        })?,
        Some(Value::Number(number)) => number.as_f64().ok_or_else(|| {
            Error::InvalidField("amount", format!("{number} is not a number"))
        })?,
        Some(other) => {
            return Err(Error::InvalidField(
                "amount",
                format!("{other} is not a number"),
            ));
        }
    };

    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidField(
            "amount",
            "must be a positive number".to_owned(),
        ));
    }

    Ok(amount)
}

/// Parse a date given either as `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [Error::InvalidField] if `text` is in neither format.
pub(crate) fn parse_date(text: &str) -> Result<OffsetDateTime, Error> {
    if let Ok(date) = Date::parse(text, DATE_FORMAT) {
        return Ok(date.midnight().assume_utc());
    }

    OffsetDateTime::parse(text, &Rfc3339).map_err(|_| {
        Error::InvalidField(
            "date",
            format!("{text:?} is not a date in the form YYYY-MM-DD or an RFC 3339 timestamp"),
        )
    })
}
