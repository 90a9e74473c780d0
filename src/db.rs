//! Database initialization for the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, auth::create_user_table, transaction::create_transaction_table};

/// Create the application tables if they do not exist and enable foreign keys.
///
/// Foreign key enforcement is a per-connection setting in SQLite, so this must
/// be called on every connection before use, otherwise deleting a user will
/// not cascade to their transactions.
///
/// # Errors
/// Returns an [Error::SqlError] if the tables cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it has to come first.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
