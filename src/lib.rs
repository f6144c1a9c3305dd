//! Finboard is a web app for tracking income, expenses, savings goals and tasks.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod task;
#[cfg(test)]
mod test_utils;
mod timezone;
mod user;

pub use app_state::AppState;
pub use dashboard::{Amount, GoalId, GoalName, NewExpense, add_expense, add_goal, add_income};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use task::{AutosaveQueue, NewTask, TaskStatus, TaskTitle, create_task};
pub use timezone::get_local_offset;
pub use user::UserId;

use crate::{
    alert::Alert,
    internal_server_error::{InternalServerError, invalid_timezone_fix},
    not_found::get_404_not_found_response,
    task::TaskId,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`. Pending inline edits in
/// `autosave` are written before the server is told to stop.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>, autosave: AutosaveQueue) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }

    if let Err(error) = autosave.flush().await {
        tracing::error!("could not flush pending task edits: {error}");
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An empty string was used as a task title.
    #[error("Task title cannot be empty")]
    EmptyTaskTitle,

    /// A string that is not one of the known task statuses.
    #[error("\"{0}\" is not a valid task status")]
    InvalidTaskStatus(String),

    /// An empty string was used as a goal name.
    #[error("Goal name cannot be empty")]
    EmptyGoalName,

    /// An amount that is not a finite number greater than zero.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// An expense referred to a goal that does not exist.
    #[error("the goal ID {0} does not refer to a valid goal")]
    UnknownGoal(dashboard::GoalId),

    /// A date or date-time submitted in a form could not be parsed.
    #[error("could not parse the date \"{0}\"")]
    InvalidDate(String),

    /// A record timestamp did not match the "DD.MM.YYYY, HH:MM:SS" format.
    ///
    /// Aggregations skip such records instead of returning this error.
    #[error("could not parse the timestamp \"{0}\"")]
    UnparseableTimestamp(String),

    /// Tried to update a task that does not exist
    #[error("tried to update a task that is not in the database")]
    UpdateMissingTask,

    /// Tried to delete a task that does not exist
    #[error("tried to delete a task that is not in the database")]
    DeleteMissingTask,

    /// Tried to move a task relative to a task that is not in the list.
    #[error("could not find task {0} in the task list")]
    ReorderMissingTask(TaskId),

    /// The background writer for inline task edits has stopped.
    #[error("the autosave queue is not running")]
    AutosaveUnavailable,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => {
                InternalServerError::invalid_timezone(&timezone).into_response()
            }
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for htmx requests.
    fn into_alert_response(self) -> Response {
        let (status, message, details) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings",
                invalid_timezone_fix(&timezone),
            ),
            Error::EmptyTaskTitle => (
                StatusCode::BAD_REQUEST,
                "Invalid task title",
                "Task title cannot be empty.".to_owned(),
            ),
            Error::InvalidTaskStatus(status) => (
                StatusCode::BAD_REQUEST,
                "Invalid task status",
                format!("\"{status}\" is not one of todo, in_progress, done or blocked."),
            ),
            Error::EmptyGoalName => (
                StatusCode::BAD_REQUEST,
                "Invalid goal name",
                "Goal name cannot be empty.".to_owned(),
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid amount",
                format!("{amount} is not a valid amount. Enter a number greater than zero."),
            ),
            Error::UnknownGoal(goal_id) => (
                StatusCode::BAD_REQUEST,
                "Invalid goal",
                format!("Could not find a goal with the ID {goal_id}."),
            ),
            Error::InvalidDate(date) => (
                StatusCode::BAD_REQUEST,
                "Invalid date",
                format!("Could not read the date \"{date}\"."),
            ),
            Error::UpdateMissingTask => (
                StatusCode::NOT_FOUND,
                "Could not update task",
                "The task could not be found.".to_owned(),
            ),
            Error::DeleteMissingTask => (
                StatusCode::NOT_FOUND,
                "Could not delete task",
                "The task could not be found. \
                Try refreshing the page to see if the task has already been deleted."
                    .to_owned(),
            ),
            Error::ReorderMissingTask(task_id) => (
                StatusCode::NOT_FOUND,
                "Could not move task",
                format!(
                    "Task {task_id} could not be found. \
                    Try refreshing the page to see the latest task list."
                ),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.".to_owned(),
            ),
        };

        Alert::Error {
            message: message.to_owned(),
            details,
        }
        .into_response_with_status(status)
    }
}
