//! Inline task editing endpoint.
//!
//! Edits are not written straight away, they are handed to the
//! [AutosaveQueue] which writes them once the user stops typing.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    task::{
        AutosaveQueue, TaskId, TaskUpdate,
        domain::TaskUpdateFormData,
        get_task,
    },
    user::UserId,
};

/// The state needed for editing a task.
#[derive(Debug, Clone)]
pub struct UpdateTaskEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub user_id: UserId,
    pub autosave: AutosaveQueue,
}

impl FromRef<AppState> for UpdateTaskEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
            autosave: state.autosave.clone(),
        }
    }
}

/// Queue an inline edit of a task.
///
/// Responds with 202 Accepted once the edit is queued.
pub async fn update_task_endpoint(
    Path(task_id): Path<TaskId>,
    State(state): State<UpdateTaskEndpointState>,
    Form(form): Form<TaskUpdateFormData>,
) -> Response {
    let update = match TaskUpdate::try_from(form) {
        Ok(update) => update,
        Err(error) => return error.into_alert_response(),
    };

    {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        match get_task(state.user_id, task_id, &connection) {
            Ok(_) => {}
            Err(Error::NotFound) => return Error::UpdateMissingTask.into_alert_response(),
            Err(error) => {
                tracing::error!("Could not check task {task_id} before editing: {error}");
                return error.into_alert_response();
            }
        }
    }

    if update.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    match state.autosave.schedule(task_id, update) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(error) => {
            tracing::error!("Could not queue edit of task {task_id}: {error}");
            error.into_alert_response()
        }
    }
}
