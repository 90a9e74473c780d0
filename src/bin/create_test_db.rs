use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use tally_rs::{
    NewUser, PasswordHash, Transaction, TransactionType, create_transaction, create_user,
    initialize_db,
};

/// A utility for creating a test database for the REST API server of tally_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
///
/// The database has one user, `test@example.com` with the password `test`,
/// and a few weeks of transactions.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let user = create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: "test@example.com".to_owned(),
            contact: String::new(),
            password_hash: PasswordHash::new("test", PasswordHash::DEFAULT_COST)?,
        },
        &conn,
    )?;

    println!("Creating transactions...");

    let start = OffsetDateTime::now_utc() - Duration::weeks(4);
    let samples = [
        (2500.0, TransactionType::Income, "Salary", "Work"),
        (1200.0, TransactionType::Expense, "Rent", "Housing"),
        (85.4, TransactionType::Expense, "Supermarket", "Food"),
        (12.5, TransactionType::Expense, "Bus fare", "Transport"),
        (150.0, TransactionType::Income, "Sold bike", ""),
        (64.99, TransactionType::Expense, "Power bill", "Utilities"),
        (42.0, TransactionType::Expense, "Takeaways", "Food"),
    ];

    for (day, (amount, transaction_type, description, category)) in samples.into_iter().enumerate()
    {
        create_transaction(
            Transaction::build(user.id, amount, transaction_type, description)
                .category(category)
                .date(start + Duration::days(day as i64 * 4)),
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
