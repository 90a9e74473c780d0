//! Transactions: the incomes and expenses recorded by users.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transactions
//! - The JSON endpoints for creating, listing, deleting and exporting transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod export_endpoint;
mod form;
mod list_endpoint;

pub use core::{
    Transaction, TransactionBuilder, TransactionType, create_transaction,
    create_transaction_table, get_transaction, get_transactions_by_user,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use export_endpoint::export_transactions_endpoint;
pub use list_endpoint::list_transactions_endpoint;

#[cfg(test)]
pub use core::count_transactions;
