//! Database operations for tasks.
//!
//! Every query is scoped to a user, a task that belongs to another user is
//! treated the same as a task that does not exist.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    task::{NewTask, Task, TaskId, TaskTitle, TaskUpdate, ordering::next_sort_key},
    user::UserId,
};

const TASK_COLUMNS: &str =
    "id, title, content, status, start_date, end_date, sort_key, created_at, updated_at";

/// Create a task at the end of the user's list and return it with its generated ID.
pub fn create_task(
    user_id: UserId,
    new_task: NewTask,
    connection: &Connection,
) -> Result<Task, Error> {
    let existing_tasks = get_tasks(user_id, connection)?;
    let sort_key = next_sort_key(&existing_tasks);
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO task (user_id, title, content, status, start_date, end_date, sort_key, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8);",
        (
            user_id,
            new_task.title.as_ref(),
            &new_task.content,
            new_task.status,
            new_task.start_date,
            new_task.end_date,
            sort_key,
            now,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Task {
        id,
        title: new_task.title,
        content: new_task.content,
        status: new_task.status,
        start_date: new_task.start_date,
        end_date: new_task.end_date,
        sort_key,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve a single task by ID.
pub fn get_task(user_id: UserId, task_id: TaskId, connection: &Connection) -> Result<Task, Error> {
    connection
        .prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE id = :id AND user_id = :user_id;"
        ))?
        .query_row(
            rusqlite::named_params! {":id": task_id, ":user_id": user_id},
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the user's tasks in list order.
pub fn get_tasks(user_id: UserId, connection: &Connection) -> Result<Vec<Task>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE user_id = :user_id ORDER BY sort_key ASC, id ASC;"
        ))?
        .query_map(&[(":user_id", &user_id)], map_row)?
        .map(|maybe_task| maybe_task.map_err(|error| error.into()))
        .collect()
}

/// Apply a partial edit to a task. Returns an error if the task doesn't exist.
pub fn update_task(
    user_id: UserId,
    task_id: TaskId,
    update: TaskUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let task = match get_task(user_id, task_id, connection) {
        Ok(task) => task,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTask),
        Err(error) => return Err(error),
    };

    let title = update.title.unwrap_or(task.title);
    let content = update.content.unwrap_or(task.content);
    let status = update.status.unwrap_or(task.status);
    let start_date = update.start_date.unwrap_or(task.start_date);
    let end_date = update.end_date.unwrap_or(task.end_date);

    let rows_affected = connection.execute(
        "UPDATE task
        SET title = ?1, content = ?2, status = ?3, start_date = ?4, end_date = ?5, updated_at = ?6
        WHERE id = ?7 AND user_id = ?8",
        (
            title.as_ref(),
            content,
            status,
            start_date,
            end_date,
            OffsetDateTime::now_utc(),
            task_id,
            user_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTask);
    }

    Ok(())
}

/// Move a task to the position given by `sort_key`.
pub fn set_sort_key(
    user_id: UserId,
    task_id: TaskId,
    sort_key: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE task SET sort_key = ?1 WHERE id = ?2 AND user_id = ?3",
        (sort_key, task_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::ReorderMissingTask(task_id));
    }

    Ok(())
}

/// Write a batch of sort keys in a single transaction.
///
/// Either every key is written or none are.
pub fn apply_sort_keys(
    user_id: UserId,
    sort_keys: &[(TaskId, f64)],
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    for &(task_id, sort_key) in sort_keys {
        set_sort_key(user_id, task_id, sort_key, &transaction)?;
    }

    transaction.commit()?;

    Ok(())
}

/// Delete a task by ID. Returns an error if the task doesn't exist.
pub fn delete_task(user_id: UserId, task_id: TaskId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM task WHERE id = ?1 AND user_id = ?2",
        (task_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTask);
    }

    Ok(())
}

/// Initialize the task table and indexes.
pub fn create_task_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS task (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            content TEXT,
            status TEXT NOT NULL DEFAULT 'todo',
            start_date TEXT NOT NULL,
            end_date TEXT,
            sort_key REAL NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_task_user_sort_key ON task(user_id, sort_key);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Task, rusqlite::Error> {
    let raw_title: String = row.get(1)?;

    Ok(Task {
        id: row.get(0)?,
        title: TaskTitle::new_unchecked(&raw_title),
        content: row.get(2)?,
        status: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        sort_key: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
