//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{Type, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{Error, auth::UserID, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// Parse a transaction type from user input, ignoring case.
    ///
    /// Returns `None` for anything other than "income" or "expense".
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Interpret a stored type, treating anything that is not "income" as an expense.
    fn from_stored(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("income") {
            Self::Income
        } else {
            Self::Expense
        }
    }

    /// The lowercase name used in storage and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expense or income recorded by a user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// A text description of what the transaction was for.
    pub description: String,
    /// A free-form category, e.g. "Food". May be empty.
    pub category: String,
    /// The amount of money spent or earned. Always read as a finite number.
    pub amount: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// When the transaction happened, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserID,
        amount: f64,
        transaction_type: TransactionType,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            amount,
            transaction_type,
            description: description.to_owned(),
            category: String::new(),
            date: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// let builder = Transaction::build(user_id, 45.99, TransactionType::Expense, "Groceries")
///     .category("Food")
///     .date(datetime!(2025-01-15 00:00 UTC));
/// let transaction = create_transaction(builder, &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The user that will own the transaction.
    pub user_id: UserID,

    /// The monetary amount of the transaction.
    ///
    /// Amounts are unsigned, the direction of the money is given by
    /// `transaction_type`.
    pub amount: f64,

    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category: String,

    /// When the transaction happened.
    ///
    /// Defaults to the time of insertion if not specified.
    pub date: Option<OffsetDateTime>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category(mut self, category: &str) -> Self {
        category.clone_into(&mut self.category);
        self
    }

    /// Set the date for the transaction.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date);
        self
    }
}

// ============================================================================
// DATE STORAGE
// ============================================================================

/// Dates are stored in UTC with a fixed width so that text order is time order.
const STORED_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Format `date` the way it is stored in the database.
pub(crate) fn format_stored_date(date: OffsetDateTime) -> Result<String, Error> {
    date.to_offset(UtcOffset::UTC)
        .format(STORED_DATE_FORMAT)
        .map_err(|error| Error::InvalidField("date", error.to_string()))
}

fn parse_stored_date(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    match PrimitiveDateTime::parse(text, STORED_DATE_FORMAT) {
        Ok(date) => Ok(date.assume_utc()),
        Err(_) => OffsetDateTime::parse(text, &Rfc3339),
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// If the builder has no date, the database fills in the current time.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidField] if the owning user does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let date = builder.date.map(format_stored_date).transpose()?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, description, category, amount, type, date)
             VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')))
             RETURNING id, user_id, description, category, amount, type, date",
        )?
        .query_row(
            (
                builder.user_id.as_i64(),
                builder.description,
                builder.category,
                builder.amount,
                builder.transaction_type.as_str(),
                date,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidField(
                "userId",
                format!("user {} does not exist", builder.user_id),
            ),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, description, category, amount, type, date
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get all of a user's transactions, newest first.
///
/// Transactions on the same date are ordered by descending ID.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, description, category, amount, type, date
             FROM \"transaction\" WHERE user_id = :user_id
             ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// Transactions are deleted along with the user that owns them.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT '',
                amount REAL NOT NULL,
                type TEXT NOT NULL,
                date TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Covers listing a user's transactions by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Malformed amounts read as zero and unknown types read as expenses.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let description: Option<String> = row.get(2)?;
    let category: Option<String> = row.get(3)?;
    let amount = read_amount(row.get_ref(4)?);
    let transaction_type = TransactionType::from_stored(row.get_ref(5)?.as_str().unwrap_or(""));
    let raw_date: String = row.get(6)?;
    let date = parse_stored_date(&raw_date).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        id,
        user_id,
        description: description.unwrap_or_default(),
        category: category.unwrap_or_default(),
        amount,
        transaction_type,
        date,
    })
}

fn read_amount(value: ValueRef<'_>) -> f64 {
    let amount = match value {
        ValueRef::Real(amount) => amount,
        ValueRef::Integer(amount) => amount as f64,
        ValueRef::Text(text) => std::str::from_utf8(text)
            .ok()
            .and_then(|text| text.trim().parse::<f64>().ok())
            .unwrap_or(0.0),
        ValueRef::Null | ValueRef::Blob(_) => 0.0,
    };

    if amount.is_finite() { amount } else { 0.0 }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod serde_tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        auth::UserID,
        transaction::{Transaction, TransactionType},
    };

    #[test]
    fn transaction_serializes_as_camel_case_json() {
        let transaction = Transaction {
            id: 1,
            user_id: UserID::new(1),
            description: "Salary".to_owned(),
            category: "Work".to_owned(),
            amount: 100.0,
            transaction_type: TransactionType::Income,
            date: datetime!(2025-01-05 00:00 UTC),
        };

        let value = serde_json::to_value(&transaction).unwrap();

        assert_eq!(
            value,
            json!({
                "id": 1,
                "userId": 1,
                "description": "Salary",
                "category": "Work",
                "amount": 100.0,
                "type": "income",
                "date": "2025-01-05T00:00:00Z"
            })
        );
    }

    #[test]
    fn transaction_type_parse_ignores_case() {
        assert_eq!(TransactionType::parse("Income"), Some(TransactionType::Income));
        assert_eq!(TransactionType::parse(" EXPENSE "), Some(TransactionType::Expense));
        assert_eq!(TransactionType::parse("refund"), None);
    }
}
