//! Income and expense records and their database operations.

use rusqlite::{Connection, Row};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    dashboard::{
        GoalId,
        bucketing::{AmountRecord, DISPLAY_TIMESTAMP_FORMAT},
    },
    database_id::DatabaseId,
    user::UserId,
};

/// A finite amount of money greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    /// Create an amount.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `amount` is zero, negative, NaN or infinite.
    pub fn new(amount: f64) -> Result<Self, Error> {
        if amount.is_finite() && amount > 0.0 {
            Ok(Self(amount))
        } else {
            Err(Error::InvalidAmount(amount))
        }
    }

    /// The amount as a plain number.
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// Money added to the balance.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEntry {
    /// The row ID.
    pub id: DatabaseId,
    /// How much was added.
    pub amount: f64,
    /// When the money came in.
    pub date: OffsetDateTime,
}

/// Money taken from the balance, optionally put towards a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The row ID.
    pub id: DatabaseId,
    /// How much was spent.
    pub amount: f64,
    /// What the money was spent on, never empty.
    pub category: String,
    /// When the money was spent.
    pub date: OffsetDateTime,
    /// The goal the money was put towards, if any.
    pub goal_id: Option<GoalId>,
}

/// Something with an amount and the time it happened.
pub trait Dated {
    /// The amount of money.
    fn amount(&self) -> f64;
    /// When the amount was recorded.
    fn date(&self) -> OffsetDateTime;
}

impl Dated for BalanceEntry {
    fn amount(&self) -> f64 {
        self.amount
    }

    fn date(&self) -> OffsetDateTime {
        self.date
    }
}

impl Dated for Expense {
    fn amount(&self) -> f64 {
        self.amount
    }

    fn date(&self) -> OffsetDateTime {
        self.date
    }
}

/// Format a date-time for display in the local timezone, e.g. "15.03.2025, 10:00:00".
pub fn format_display_timestamp(date: OffsetDateTime, local_offset: UtcOffset) -> Option<String> {
    date.to_offset(local_offset)
        .format(DISPLAY_TIMESTAMP_FORMAT)
        .inspect_err(|error| tracing::warn!("could not format {date}: {error}"))
        .ok()
}

/// Convert stored records to the timestamped amounts used for bucketing.
///
/// Timestamps are rendered in `local_offset` so records land in the local
/// month and weekday.
pub fn to_amount_records<T: Dated>(records: &[T], local_offset: UtcOffset) -> Vec<AmountRecord> {
    records
        .iter()
        .map(|record| AmountRecord {
            amount: record.amount(),
            timestamp: format_display_timestamp(record.date(), local_offset),
        })
        .collect()
}

pub(super) fn insert_balance_entry(
    user_id: UserId,
    amount: Amount,
    date: OffsetDateTime,
    connection: &Connection,
) -> Result<BalanceEntry, Error> {
    // Dates are stored in UTC so that ordering by the text column is chronological.
    let date = date.to_offset(UtcOffset::UTC);
    connection.execute(
        "INSERT INTO balance_entry (user_id, amount, date) VALUES (?1, ?2, ?3);",
        (user_id, amount.as_f64(), date),
    )?;

    Ok(BalanceEntry {
        id: connection.last_insert_rowid(),
        amount: amount.as_f64(),
        date,
    })
}

pub(super) fn insert_expense(
    user_id: UserId,
    amount: Amount,
    category: &str,
    date: OffsetDateTime,
    goal_id: Option<GoalId>,
    connection: &Connection,
) -> Result<Expense, Error> {
    let date = date.to_offset(UtcOffset::UTC);
    connection.execute(
        "INSERT INTO expense (user_id, amount, category, date, goal_id) VALUES (?1, ?2, ?3, ?4, ?5);",
        (user_id, amount.as_f64(), category, date, goal_id),
    )?;

    Ok(Expense {
        id: connection.last_insert_rowid(),
        amount: amount.as_f64(),
        category: category.to_owned(),
        date,
        goal_id,
    })
}

/// Retrieve the user's balance history, oldest first.
pub fn get_balance_entries(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<BalanceEntry>, Error> {
    connection
        .prepare(
            "SELECT id, amount, date FROM balance_entry WHERE user_id = :user_id ORDER BY date ASC, id ASC;",
        )?
        .query_map(&[(":user_id", &user_id)], |row| {
            Ok(BalanceEntry {
                id: row.get(0)?,
                amount: row.get(1)?,
                date: row.get(2)?,
            })
        })?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the user's expenses, oldest first.
pub fn get_expenses(user_id: UserId, connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, amount, category, date, goal_id FROM expense
            WHERE user_id = :user_id ORDER BY date ASC, id ASC;",
        )?
        .query_map(&[(":user_id", &user_id)], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Initialize the balance history and expense tables.
pub fn create_record_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS balance_entry (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_balance_entry_user ON balance_entry(user_id);

        CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL,
            goal_id INTEGER,
            FOREIGN KEY(goal_id) REFERENCES goal(id) ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user ON expense(user_id);",
    )?;

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: row.get(2)?,
        date: row.get(3)?,
        goal_id: row.get(4)?,
    })
}

#[cfg(test)]
mod amount_tests {
    use crate::Error;

    use super::Amount;

    #[test]
    fn accepts_positive_amounts() {
        assert_eq!(Amount::new(0.01).map(|amount| amount.as_f64()), Ok(0.01));
    }

    #[test]
    fn rejects_zero_negative_and_non_finite() {
        for amount in [0.0, -5.0, f64::INFINITY] {
            assert_eq!(Amount::new(amount), Err(Error::InvalidAmount(amount)));
        }

        assert!(Amount::new(f64::NAN).is_err());
    }
}


#[cfg(test)]
mod record_query_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{dashboard::goal::create_goal_table, user::UserId};

    use super::{
        Amount, create_record_tables, get_balance_entries, get_expenses, insert_balance_entry,
        insert_expense,
    };

    const USER: UserId = UserId::new(1);

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_goal_table(&connection).unwrap();
        create_record_tables(&connection).unwrap();
        connection
    }

    #[test]
    fn balance_entries_are_scoped_to_user_and_ordered_by_date() {
        let connection = get_test_db_connection();
        let later = insert_balance_entry(
            USER,
            Amount::new(20.0).unwrap(),
            datetime!(2025-03-20 10:00:00 UTC),
            &connection,
        )
        .unwrap();
        let earlier = insert_balance_entry(
            USER,
            Amount::new(10.0).unwrap(),
            datetime!(2025-03-10 10:00:00 UTC),
            &connection,
        )
        .unwrap();
        insert_balance_entry(
            UserId::new(2),
            Amount::new(99.0).unwrap(),
            datetime!(2025-03-15 10:00:00 UTC),
            &connection,
        )
        .unwrap();

        let entries = get_balance_entries(USER, &connection);

        assert_eq!(entries, Ok(vec![earlier, later]));
    }

    #[test]
    fn expenses_round_trip() {
        let connection = get_test_db_connection();
        let expense = insert_expense(
            USER,
            Amount::new(12.5).unwrap(),
            "Food",
            datetime!(2025-03-15 10:00:00 UTC),
            None,
            &connection,
        )
        .unwrap();

        assert_eq!(get_expenses(USER, &connection), Ok(vec![expense]));
    }
}
