//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    dashboard::{create_goal_table, create_profile_table, create_record_tables},
    task::create_task_table,
};

/// Create all tables that do not exist yet.
///
/// The tables are created in a single exclusive transaction, so either all of
/// them exist afterwards or none of the missing ones do.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_profile_table(&transaction)?;
    create_goal_table(&transaction)?;
    create_record_tables(&transaction)?;
    create_task_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
