//! The user's running totals and the operations that change them.
//!
//! Each operation runs in a single transaction so the records and the totals
//! never disagree.

use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::{
    Error,
    dashboard::{
        GoalId,
        goal::{Goal, GoalName, add_to_goal_balance, get_goal, insert_goal},
        records::{Amount, BalanceEntry, Expense, insert_balance_entry, insert_expense},
    },
    user::UserId,
};

/// The category given to expenses that have neither a category nor a goal.
pub const DEFAULT_CATEGORY: &str = "Other";

/// The user's totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub total_income: f64,
    pub total_expense: f64,
    pub current_balance: f64,
    /// When the balance last changed, `None` if it never has.
    pub current_balance_date: Option<OffsetDateTime>,
}

/// An expense that has not been recorded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// How much was spent.
    pub amount: Amount,
    /// May be empty, see [add_expense] for how the category is chosen.
    pub category: String,
    /// When the expense happened, defaults to now.
    pub date: Option<OffsetDateTime>,
    /// The goal to put the money towards.
    pub goal_id: Option<GoalId>,
}

/// Retrieve the user's totals, all zero if nothing has been recorded yet.
pub fn get_profile(user_id: UserId, connection: &Connection) -> Result<Profile, Error> {
    let profile = connection
        .query_row(
            "SELECT total_income, total_expense, current_balance, current_balance_date
            FROM profile WHERE user_id = ?1;",
            [user_id],
            |row| {
                Ok(Profile {
                    total_income: row.get(0)?,
                    total_expense: row.get(1)?,
                    current_balance: row.get(2)?,
                    current_balance_date: row.get(3)?,
                })
            },
        )
        .optional()?;

    Ok(profile.unwrap_or_default())
}

fn ensure_profile(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT OR IGNORE INTO profile (user_id) VALUES (?1);",
        [user_id],
    )?;

    Ok(())
}

/// Record income and add it to the balance.
///
/// The entry is dated `date`, or now if `date` is `None`, and the balance
/// date moves to that time.
pub fn add_income(
    user_id: UserId,
    amount: Amount,
    date: Option<OffsetDateTime>,
    connection: &Connection,
) -> Result<BalanceEntry, Error> {
    let date = date.unwrap_or_else(OffsetDateTime::now_utc);
    let transaction = connection.unchecked_transaction()?;

    ensure_profile(user_id, &transaction)?;
    let entry = insert_balance_entry(user_id, amount, date, &transaction)?;
    transaction.execute(
        "UPDATE profile SET
            current_balance = current_balance + ?1,
            total_income = total_income + ?1,
            current_balance_date = ?2
        WHERE user_id = ?3;",
        (amount.as_f64(), date, user_id),
    )?;

    transaction.commit()?;

    Ok(entry)
}

/// Record an expense and take it from the balance.
///
/// The balance never drops below zero. If the expense is put towards a goal,
/// the goal's balance grows by the same amount. An empty category falls back
/// to the goal's name, or to [DEFAULT_CATEGORY] when there is no goal.
///
/// # Errors
/// Returns [Error::UnknownGoal] if `goal_id` does not refer to one of the
/// user's goals, in which case nothing is written.
pub fn add_expense(
    user_id: UserId,
    expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    let now = OffsetDateTime::now_utc();
    let transaction = connection.unchecked_transaction()?;

    let goal = match expense.goal_id {
        Some(goal_id) => match get_goal(user_id, goal_id, &transaction) {
            Ok(goal) => Some(goal),
            Err(Error::NotFound) => return Err(Error::UnknownGoal(goal_id)),
            Err(error) => return Err(error),
        },
        None => None,
    };

    let category = choose_category(&expense.category, goal.as_ref());

    ensure_profile(user_id, &transaction)?;
    let inserted = insert_expense(
        user_id,
        expense.amount,
        &category,
        expense.date.unwrap_or(now),
        expense.goal_id,
        &transaction,
    )?;
    transaction.execute(
        "UPDATE profile SET
            current_balance = MAX(current_balance - ?1, 0),
            total_expense = total_expense + ?1,
            current_balance_date = ?2
        WHERE user_id = ?3;",
        (expense.amount.as_f64(), now, user_id),
    )?;

    if let Some(goal) = goal {
        add_to_goal_balance(user_id, goal.id, expense.amount, &transaction)?;
    }

    transaction.commit()?;

    Ok(inserted)
}

/// Create a savings goal with nothing saved yet.
pub fn add_goal(
    user_id: UserId,
    name: &GoalName,
    price: Amount,
    connection: &Connection,
) -> Result<Goal, Error> {
    insert_goal(user_id, name, price, connection)
}

fn choose_category(category: &str, goal: Option<&Goal>) -> String {
    let category = category.trim();

    match (category.is_empty(), goal) {
        (false, _) => category.to_owned(),
        (true, Some(goal)) => goal.name.clone(),
        (true, None) => DEFAULT_CATEGORY.to_owned(),
    }
}

pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS profile (
            user_id INTEGER PRIMARY KEY,
            total_income REAL NOT NULL DEFAULT 0,
            total_expense REAL NOT NULL DEFAULT 0,
            current_balance REAL NOT NULL DEFAULT 0,
            current_balance_date TEXT
        );",
        (),
    )?;

    Ok(())
}
