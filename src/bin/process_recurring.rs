use std::{path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use fintrack_rs::{initialize_db, local_today, materialize_recurring_transactions};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Generate the transactions that recurring transactions are due, once.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The canonical timezone that decides the date of "today", e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// Generate transactions as of this date (YYYY-MM-DD) instead of today.
    #[arg(long, value_parser = parse_date)]
    date: Option<Date>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_filter(filter::LevelFilter::INFO),
        )
        .init();

    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let today = match args.date {
        Some(date) => date,
        None => match local_today(&args.timezone) {
            Ok(date) => date,
            Err(error) => {
                print_error(error);
                exit(1);
            }
        },
    };

    let connection = Connection::open(db_path)
        .unwrap_or_else(|_| panic!("Could not open the database at {db_path:?}"));

    if let Err(error) = initialize_db(&connection) {
        print_error(format!("Could not initialize the database: {error}"));
        exit(1);
    }

    match materialize_recurring_transactions(today, &connection) {
        Ok(summary) => println!("{}", summary.message()),
        Err(error) => {
            print_error(format!("Could not process recurring transactions: {error}"));
            exit(1);
        }
    }
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, DATE_FORMAT).map_err(|error| format!("expected YYYY-MM-DD: {error}"))
}

fn validate_db_path(db_path: &Path) {
    if !db_path.is_file() {
        print_error(format!("File does not exist at {db_path:#?}!"));
        exit(1);
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string());
}
