use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, macros::format_description};

use pocket_ledger::{
    LedgerConfig, Transaction, TransactionPayload, Username, initialize_db, insert_transaction,
    local_now,
};

/// Record a single transaction in a user's ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The user whose ledger the transaction is written to.
    #[arg(long, short)]
    username: String,

    /// The transaction as JSON, e.g.
    /// '{"amount": "45,00", "bank_or_source": "Nubank", "description": "Lunch"}'.
    #[arg(long, short)]
    payload: String,

    /// The date of the transaction as YYYY-MM-DD. Defaults to today.
    #[arg(long, short)]
    date: Option<String>,

    /// The canonical name of the local timezone, used when no date is given.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// Record the transaction at midnight instead of the current time of day.
    #[arg(long)]
    date_only: bool,
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(transaction) => print_transaction(&transaction),
        Err(message) => {
            eprintln!("{message}");
            exit(1);
        }
    }
}

fn run(args: &Args) -> Result<Transaction, String> {
    let username = Username::new(&args.username).map_err(|error| error.to_string())?;
    let payload = TransactionPayload::from_json(&args.payload).map_err(|error| error.to_string())?;

    let config = LedgerConfig {
        record_time_of_day: !args.date_only,
    };
    let now = local_now(&args.timezone)
        .ok_or_else(|| format!("\"{}\" is not a valid timezone", args.timezone))?;

    let occurred_at = match &args.date {
        Some(date) => {
            let date = Date::parse(date, format_description!("[year]-[month]-[day]"))
                .map_err(|_| format!("invalid date \"{date}\", expected YYYY-MM-DD"))?;
            config.occurred_at(date, None)
        }
        None => config.occurred_at(now.date(), Some(now.time())),
    };

    let transaction = payload
        .into_new_transaction(occurred_at)
        .map_err(|error| error.to_string())?;

    let connection = Connection::open(&args.db_path)
        .map_err(|error| format!("Could not open the database at {}: {error}", args.db_path))?;
    initialize_db(&connection)
        .map_err(|error| format!("Could not initialize the database: {error}"))?;

    insert_transaction(&username, transaction, &connection)
        .map_err(|error| format!("Could not record the transaction: {error}"))
}

fn print_transaction(transaction: &Transaction) {
    println!("Recorded transaction {}:", transaction.id);
    println!("  kind:           {}", transaction.kind);
    println!("  amount:         {}", transaction.amount);
    println!("  card_type:      {}", transaction.card_type);
    println!("  bank_or_source: {}", transaction.bank_or_source);
    println!("  description:    {}", transaction.description);
    println!("  occurred_at:    {}", transaction.occurred_at);
}
