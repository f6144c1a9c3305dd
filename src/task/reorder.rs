//! Drag-and-drop reordering of the task list.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    task::{
        AutosaveQueue, TaskId,
        db::{apply_sort_keys, set_sort_key},
        filter::TaskFilters,
        get_tasks,
        list::task_list_view,
        ordering::{allocate_sort_key, key_collides, renumber_sort_keys},
    },
    timezone::today_local,
    user::UserId,
};

/// The state needed for reordering tasks.
#[derive(Debug, Clone)]
pub struct ReorderTasksState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub user_id: UserId,
    /// Flushed before the list is re-rendered so queued inline edits are not lost.
    pub autosave: AutosaveQueue,
}

impl FromRef<AppState> for ReorderTasksState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            user_id: state.user_id,
            autosave: state.autosave.clone(),
        }
    }
}

/// The task that was dragged and the task it was dropped on.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReorderFormData {
    pub moved_id: TaskId,
    pub target_id: TaskId,
}

/// Move a task next to the task it was dropped on and return the re-sorted list.
///
/// Dropping a task onto itself changes nothing and returns 204 No Content.
pub async fn reorder_tasks_endpoint(
    State(state): State<ReorderTasksState>,
    Query(filters): Query<TaskFilters>,
    Form(form): Form<ReorderFormData>,
) -> Response {
    if form.moved_id == form.target_id {
        return StatusCode::NO_CONTENT.into_response();
    }

    let today = match today_local(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    // The writer needs the connection lock, so flush before taking it.
    if let Err(error) = state.autosave.flush().await {
        tracing::error!("Could not flush pending task edits: {error}");
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = move_task(state.user_id, form.moved_id, form.target_id, &connection) {
        if !matches!(error, Error::ReorderMissingTask(_)) {
            tracing::error!(
                "Could not move task {} onto task {}: {error}",
                form.moved_id,
                form.target_id
            );
        }

        return error.into_alert_response();
    }

    match get_tasks(state.user_id, &connection) {
        Ok(tasks) => task_list_view(&tasks, &filters, today).into_response(),
        Err(error) => {
            tracing::error!("Failed to retrieve tasks after reordering: {error}");
            error.into_alert_response()
        }
    }
}

/// Give `moved_id` a sort key that places it next to `target_id` and return the key.
///
/// If the gap between the neighbours has run out of precision, the whole
/// list is renumbered first and the key is allocated again.
///
/// # Errors
/// Returns [Error::ReorderMissingTask] if either task is not in the user's
/// list, in which case nothing is written.
pub fn move_task(
    user_id: UserId,
    moved_id: TaskId,
    target_id: TaskId,
    connection: &Connection,
) -> Result<f64, Error> {
    let mut tasks = get_tasks(user_id, connection)?;

    let missing_task = [moved_id, target_id]
        .into_iter()
        .find(|id| !tasks.iter().any(|task| task.id == *id));

    if let Some(missing_id) = missing_task {
        return Err(Error::ReorderMissingTask(missing_id));
    }

    let mut sort_key = allocate_sort_key(&tasks, &moved_id, &target_id)
        .ok_or(Error::ReorderMissingTask(moved_id))?;

    if key_collides(&tasks, &moved_id, sort_key) {
        tracing::info!("Sort keys for user {user_id} have collided, renumbering task list.");

        let renumbered = renumber_sort_keys(&tasks);
        apply_sort_keys(user_id, &renumbered, connection)?;

        for task in tasks.iter_mut() {
            if let Some((_, key)) = renumbered.iter().find(|(id, _)| *id == task.id) {
                task.sort_key = *key;
            }
        }

        sort_key = allocate_sort_key(&tasks, &moved_id, &target_id)
            .ok_or(Error::ReorderMissingTask(moved_id))?;
    }

    set_sort_key(user_id, moved_id, sort_key, connection)?;

    Ok(sort_key)
}
