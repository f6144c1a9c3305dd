//! Savings goals that expenses can be put towards.

use std::fmt::Display;

use rusqlite::{Connection, Row};

use crate::{Error, dashboard::records::Amount, database_id::DatabaseId, user::UserId};

pub type GoalId = DatabaseId;

/// The name of a savings goal.
///
/// Guaranteed to be non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalName(String);

impl GoalName {
    /// Create a goal name.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyGoalName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyGoalName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    #[cfg(test)]
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for GoalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for GoalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something the user is saving up for.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    /// The amount needed to reach the goal.
    pub price: f64,
    /// The amount put towards the goal so far.
    pub balance: f64,
}

impl Goal {
    /// How far along the goal is as a percentage in `[0, 100]`.
    pub fn progress_percent(&self) -> f64 {
        if self.price <= 0.0 {
            return 0.0;
        }

        (self.balance / self.price * 100.0).clamp(0.0, 100.0)
    }
}

pub(super) fn insert_goal(
    user_id: UserId,
    name: &GoalName,
    price: Amount,
    connection: &Connection,
) -> Result<Goal, Error> {
    connection.execute(
        "INSERT INTO goal (user_id, name, price, balance) VALUES (?1, ?2, ?3, 0);",
        (user_id, name.as_ref(), price.as_f64()),
    )?;

    Ok(Goal {
        id: connection.last_insert_rowid(),
        name: name.to_string(),
        price: price.as_f64(),
        balance: 0.0,
    })
}

/// Retrieve a goal belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the goal does not exist or belongs to another user.
pub fn get_goal(user_id: UserId, goal_id: GoalId, connection: &Connection) -> Result<Goal, Error> {
    connection
        .prepare("SELECT id, name, price, balance FROM goal WHERE id = :id AND user_id = :user_id;")?
        .query_row(
            rusqlite::named_params! { ":id": goal_id, ":user_id": user_id },
            map_goal_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the user's goals in the order they were created.
pub fn get_goals(user_id: UserId, connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare("SELECT id, name, price, balance FROM goal WHERE user_id = :user_id ORDER BY id ASC;")?
        .query_map(&[(":user_id", &user_id)], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(|error| error.into()))
        .collect()
}

pub(super) fn add_to_goal_balance(
    user_id: UserId,
    goal_id: GoalId,
    amount: Amount,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE goal SET balance = balance + ?1 WHERE id = ?2 AND user_id = ?3;",
        (amount.as_f64(), goal_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UnknownGoal(goal_id));
    }

    Ok(())
}

pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            price REAL NOT NULL,
            balance REAL NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_goal_user ON goal(user_id);",
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        balance: row.get(3)?,
    })
}


#[cfg(test)]
mod goal_progress_tests {
    use super::Goal;

    fn goal(price: f64, balance: f64) -> Goal {
        Goal {
            id: 1,
            name: "Bike".to_owned(),
            price,
            balance,
        }
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(goal(200.0, 50.0).progress_percent(), 25.0);
        assert_eq!(goal(200.0, 500.0).progress_percent(), 100.0);
        assert_eq!(goal(0.0, 10.0).progress_percent(), 0.0);
    }
}

#[cfg(test)]
mod goal_query_tests {
    use rusqlite::Connection;

    use crate::{Error, dashboard::records::Amount, user::UserId};

    use super::{
        GoalName, add_to_goal_balance, create_goal_table, get_goal, get_goals, insert_goal,
    };

    const USER: UserId = UserId::new(1);

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_goal_table(&connection).unwrap();
        connection
    }

    #[test]
    fn new_goal_starts_with_zero_balance() {
        let connection = get_test_db_connection();

        let goal = insert_goal(
            USER,
            &GoalName::new_unchecked("Bike"),
            Amount::new(500.0).unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(goal.balance, 0.0);
        assert_eq!(get_goal(USER, goal.id, &connection), Ok(goal));
    }

    #[test]
    fn goals_of_other_users_are_hidden() {
        let connection = get_test_db_connection();
        let goal = insert_goal(
            UserId::new(2),
            &GoalName::new_unchecked("Car"),
            Amount::new(5000.0).unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(get_goal(USER, goal.id, &connection), Err(Error::NotFound));
        assert_eq!(get_goals(USER, &connection), Ok(vec![]));
    }

    #[test]
    fn adding_to_unknown_goal_fails() {
        let connection = get_test_db_connection();

        let result = add_to_goal_balance(USER, 42, Amount::new(5.0).unwrap(), &connection);

        assert_eq!(result, Err(Error::UnknownGoal(42)));
    }
}
