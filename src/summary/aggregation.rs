//! Totals, running balances and expense breakdowns over a user's transactions.
//!
//! Every function here borrows its input and never fails. Amounts that are
//! not finite are counted as zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{Month, OffsetDateTime};
use time_tz::{OffsetDateTimeExt, Tz};

use crate::transaction::{Transaction, TransactionType};

/// The sums of a user's income and expenses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// The sum of all income.
    pub income: f64,
    /// The sum of all expenses.
    pub expense: f64,
    /// Income minus expenses.
    pub net_balance: f64,
}

impl Totals {
    /// Whether the user has spent more than they have earned.
    pub fn is_overdrawn(&self) -> bool {
        self.net_balance < 0.0
    }
}

/// The balance after a transaction, for plotting the balance over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    /// The local date of the transaction as a short month and day, e.g. "Jan 5".
    pub label: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// The balance once the transaction is applied.
    pub balance: f64,
}

/// Everything the summary endpoint reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Income, expense and net balance.
    pub totals: Totals,
    /// The balance after each transaction in date order.
    pub running_balance: Vec<BalancePoint>,
    /// Total expenses by category.
    pub category_breakdown: BTreeMap<String, f64>,
    /// Whether the net balance is negative.
    pub overdrawn: bool,
}

/// Summarise `transactions`, labelling balance points with dates in `local_timezone`.
pub fn summarise(transactions: &[Transaction], local_timezone: &Tz) -> Summary {
    let totals = calculate_totals(transactions);

    Summary {
        totals,
        running_balance: calculate_running_balance(transactions, local_timezone),
        category_breakdown: calculate_category_breakdown(transactions),
        overdrawn: totals.is_overdrawn(),
    }
}

/// Sum income and expenses separately.
pub fn calculate_totals(transactions: &[Transaction]) -> Totals {
    let mut income = 0.0;
    let mut expense = 0.0;

    for transaction in transactions {
        match transaction.transaction_type {
            TransactionType::Income => income += finite_amount(transaction),
            TransactionType::Expense => expense += finite_amount(transaction),
        }
    }

    Totals {
        income,
        expense,
        net_balance: income - expense,
    }
}

/// The balance after each transaction, oldest first.
///
/// Transactions with the same date keep the order of their IDs. Each label
/// uses the offset `local_timezone` had on that date, so daylight saving is
/// respected.
pub fn calculate_running_balance(
    transactions: &[Transaction],
    local_timezone: &Tz,
) -> Vec<BalancePoint> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|transaction| (transaction.date, transaction.id));

    let mut balance = 0.0;

    sorted
        .into_iter()
        .map(|transaction| {
            balance += signed_amount(transaction);

            BalancePoint {
                label: format_day_label(transaction.date.to_timezone(local_timezone)),
                date: transaction.date,
                balance,
            }
        })
        .collect()
}

/// Total expenses for each category.
///
/// Categories are matched exactly, so "Food" and "food" are kept apart.
pub fn calculate_category_breakdown(transactions: &[Transaction]) -> BTreeMap<String, f64> {
    let mut breakdown = BTreeMap::new();

    for transaction in transactions {
        if transaction.transaction_type != TransactionType::Expense {
            continue;
        }

        *breakdown
            .entry(transaction.category.clone())
            .or_insert(0.0) += finite_amount(transaction);
    }

    breakdown
}

fn finite_amount(transaction: &Transaction) -> f64 {
    if transaction.amount.is_finite() {
        transaction.amount
    } else {
        0.0
    }
}

fn signed_amount(transaction: &Transaction) -> f64 {
    match transaction.transaction_type {
        TransactionType::Income => finite_amount(transaction),
        TransactionType::Expense => -finite_amount(transaction),
    }
}

fn format_day_label(date: OffsetDateTime) -> String {
    let month = match date.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{month} {}", date.day())
}
