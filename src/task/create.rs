//! Task creation endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    task::{NewTask, create_task, domain::TaskFormData},
    user::UserId,
};

/// The state needed for creating a task.
#[derive(Debug, Clone)]
pub struct CreateTaskEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub user_id: UserId,
}

impl FromRef<AppState> for CreateTaskEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
        }
    }
}

/// Handle the new task form, the task is added to the end of the list.
pub async fn create_task_endpoint(
    State(state): State<CreateTaskEndpointState>,
    Form(form): Form<TaskFormData>,
) -> Response {
    let new_task = match NewTask::try_from(form) {
        Ok(new_task) => new_task,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_task(state.user_id, new_task, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TASKS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a task: {error}");

            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod create_task_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        endpoints,
        task::{TaskStatus, TaskTitle, create_task_table, domain::TaskFormData, get_tasks},
        test_utils::{assert_hx_redirect, assert_valid_html, parse_html_fragment},
        user::UserId,
    };

    use super::{CreateTaskEndpointState, create_task_endpoint};

    fn get_test_state() -> CreateTaskEndpointState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_task_table(&connection).expect("Could not create task table");

        CreateTaskEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
            user_id: UserId::new(1),
        }
    }

    fn form(title: &str, start_date: &str) -> TaskFormData {
        TaskFormData {
            title: title.to_owned(),
            content: "Some notes".to_owned(),
            status: "in_progress".to_owned(),
            start_date: start_date.to_owned(),
            end_date: String::new(),
        }
    }

    #[tokio::test]
    async fn can_create_task() {
        let state = get_test_state();

        let response =
            create_task_endpoint(State(state.clone()), Form(form("Pay rent", "2025-03-15"))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TASKS_VIEW);

        let tasks = get_tasks(state.user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, TaskTitle::new_unchecked("Pay rent"));
        assert_eq!(tasks[0].content.as_deref(), Some("Some notes"));
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
        assert_eq!(tasks[0].start_date, date!(2025 - 03 - 15));
        assert_eq!(tasks[0].end_date, None);
    }

    #[tokio::test]
    async fn create_task_fails_on_empty_title() {
        let state = get_test_state();

        let response =
            create_task_endpoint(State(state.clone()), Form(form("  ", "2025-03-15"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert!(html.html().contains("Task title cannot be empty."));
        assert!(
            get_tasks(state.user_id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn create_task_fails_on_bad_date() {
        let state = get_test_state();

        let response = create_task_endpoint(State(state), Form(form("Foo", "yesterday"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
