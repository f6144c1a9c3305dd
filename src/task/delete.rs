//! Task deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    task::{TaskId, db::delete_task},
    user::UserId,
};

/// The state needed for deleting a task.
#[derive(Debug, Clone)]
pub struct DeleteTaskEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub user_id: UserId,
}

impl FromRef<AppState> for DeleteTaskEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
        }
    }
}

/// Handle task deletion. Returns success alert or error.
pub async fn delete_task_endpoint(
    Path(task_id): Path<TaskId>,
    State(state): State<DeleteTaskEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_task(state.user_id, task_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Task deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingTask) => Error::DeleteMissingTask.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting task {task_id}: {error}");
            error.into_alert_response()
        }
    }
}
