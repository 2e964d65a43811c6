use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use farm_budget_rs::{
    MonthRange, NewBudget, NewExpense, create_budget, create_expense, get_local_timezone,
    initialize_db,
};

/// A utility for creating a test database for the farm budget REST API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The canonical name of the timezone the server will run in, e.g. "Asia/Kolkata".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

/// Day of the month (0-based), amount in cents, category and description.
const THIS_MONTH_EXPENSES: [(i64, i64, &str, &str); 6] = [
    (0, 150_000, "Seeds & Fertilizers", "Hybrid maize seed, 25kg"),
    (1, 85_000, "Equipment", "Tiller blade replacement"),
    (3, 42_050, "Labor", "Weeding crew, two days"),
    (6, 12_999, "Utilities", "Irrigation pump electricity"),
    (9, 30_000, "Seeds & Fertilizers", "Urea, 2 bags"),
    (12, 7_525, "Transport", "Produce to the market"),
];

const LAST_MONTH_EXPENSES: [(i64, i64, &str, &str); 4] = [
    (2, 120_000, "Seeds & Fertilizers", "Wheat seed"),
    (5, 60_000, "Labor", "Harvest crew"),
    (11, 9_900, "Utilities", "Irrigation pump electricity"),
    (20, 45_000, "Equipment", "Sprayer"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let Some(local_timezone) = get_local_timezone(&args.timezone) else {
        eprintln!("Unknown timezone \"{}\"", args.timezone);
        exit(1);
    };

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let this_month = MonthRange::containing(OffsetDateTime::now_utc(), local_timezone)?;
    let last_month = this_month.previous()?;

    println!("Creating expenses for {} {}...", this_month.month(), this_month.year());
    insert_expenses(this_month, &THIS_MONTH_EXPENSES, &conn)?;

    println!("Creating expenses for {} {}...", last_month.month(), last_month.year());
    insert_expenses(last_month, &LAST_MONTH_EXPENSES, &conn)?;

    println!("Creating budget for {} {}...", this_month.month(), this_month.year());
    let category_budgets = BTreeMap::from([
        ("Seeds & Fertilizers".to_owned(), Decimal::from(1_500)),
        ("Equipment".to_owned(), Decimal::from(800)),
        ("Labor".to_owned(), Decimal::from(500)),
    ]);
    create_budget(
        NewBudget::new(
            u8::from(this_month.month()).into(),
            this_month.year().into(),
            Decimal::from(3_000),
            category_budgets,
        )?,
        &conn,
    )?;

    println!("Success!");

    Ok(())
}

fn insert_expenses(
    month: MonthRange,
    expenses: &[(i64, i64, &str, &str)],
    conn: &Connection,
) -> Result<(), Box<dyn Error>> {
    for &(day, cents, category, description) in expenses {
        let date = month.start() + Duration::days(day) + Duration::hours(9);

        if !month.contains(date) {
            continue;
        }

        create_expense(
            NewExpense::new(Decimal::new(cents, 2), category, date, description)?,
            conn,
        )?;
    }

    Ok(())
}
