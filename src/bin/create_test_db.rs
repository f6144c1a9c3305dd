use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finboard::{
    Amount, GoalName, NewExpense, NewTask, TaskStatus, TaskTitle, UserId, add_expense, add_goal,
    add_income, create_task, initialize_db,
};

/// A utility for creating a test database for the finboard server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The ID of the user that owns the sample records.
    #[arg(long, default_value_t = 1)]
    user_id: i64,
}

/// Create and populate a database for manual testing.
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

    let user_id = UserId::new(args.user_id);
    let now = OffsetDateTime::now_utc();

    println!("Creating sample goal and records...");

    let bike = add_goal(user_id, &GoalName::new("New bike")?, Amount::new(800.0)?, &conn)?;

    for months_ago in 0..4 {
        add_income(
            user_id,
            Amount::new(2500.0)?,
            Some(now - Duration::days(30 * months_ago)),
            &conn,
        )?;
    }

    let expenses = [
        (120.5, "Food", None, 1),
        (60.0, "Transport", None, 2),
        (950.0, "Rent", None, 3),
        (45.25, "Food", None, 5),
        (150.0, "", Some(bike.id), 6),
        (30.0, "", None, 8),
    ];

    for (amount, category, goal_id, days_ago) in expenses {
        add_expense(
            user_id,
            NewExpense {
                amount: Amount::new(amount)?,
                category: category.to_owned(),
                date: Some(now - Duration::days(days_ago)),
                goal_id,
            },
            &conn,
        )?;
    }

    println!("Creating sample tasks...");

    let today = now.date();
    let tasks = [
        ("Pay rent", TaskStatus::Done, -3, Some(0)),
        ("Compare insurance quotes", TaskStatus::InProgress, -1, Some(2)),
        ("Cancel unused subscriptions", TaskStatus::Todo, 0, Some(10)),
        ("File tax return", TaskStatus::Blocked, -7, None),
    ];

    for (title, status, start_offset, end_offset) in tasks {
        create_task(
            user_id,
            NewTask {
                title: TaskTitle::new(title)?,
                content: None,
                status,
                start_date: today + Duration::days(start_offset),
                end_date: end_offset.map(|days| today + Duration::days(days)),
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
