//! Task list page with filters, inline editing and drag-and-drop reordering.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, HeadElement, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    task::{
        AutosaveQueue, Task, TaskStatus,
        filter::{DeadlineFilter, DeadlineState, TaskFilters, deadline_state, filter_tasks},
        get_tasks,
    },
    timezone::today_local,
    user::UserId,
};

/// The state needed for the task list page.
#[derive(Debug, Clone)]
pub struct TasksPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub user_id: UserId,
    /// Flushed before reading so the page shows edits that are still queued.
    pub autosave: AutosaveQueue,
}

impl FromRef<AppState> for TasksPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            user_id: state.user_id,
            autosave: state.autosave.clone(),
        }
    }
}

/// Render the task list, narrowed by the filters in the query string.
pub async fn get_tasks_page(
    State(state): State<TasksPageState>,
    Query(filters): Query<TaskFilters>,
) -> Result<Response, Error> {
    let today = today_local(&state.local_timezone)?;

    if let Err(error) = state.autosave.flush().await {
        tracing::error!("Could not flush pending task edits: {error}");
    }

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let tasks = get_tasks(state.user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve tasks: {error}"))?;

    Ok(tasks_view(&tasks, &filters, today).into_response())
}

fn tasks_view(tasks: &[Task], filters: &TaskFilters, today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::TASKS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Tasks" }

                (new_task_form_view(today))
                (filter_form_view(filters))
                (task_list_view(tasks, filters, today))
            }
        }
    );

    base("Tasks", &[drag_and_drop_script()], &content)
}

fn new_task_form_view(today: Date) -> Markup {
    html!(
        form
            hx-post=(endpoints::POST_TASK)
            hx-target-error="#alert-container"
            class={ (CARD_STYLE) " grid grid-cols-1 md:grid-cols-2 gap-4" }
        {
            div
            {
                label for="title" class=(FORM_LABEL_STYLE) { "Title" }
                input
                    id="title"
                    type="text"
                    name="title"
                    placeholder="What needs doing?"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="status" class=(FORM_LABEL_STYLE) { "Status" }
                select id="status" name="status" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for status in TaskStatus::ALL {
                        option value=(status.as_str()) { (status.label()) }
                    }
                }
            }

            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "Start date" }
                input
                    id="start_date"
                    type="date"
                    name="start_date"
                    value=(today)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "End date" }
                input
                    id="end_date"
                    type="date"
                    name="end_date"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="md:col-span-2"
            {
                label for="content" class=(FORM_LABEL_STYLE) { "Description" }
                textarea
                    id="content"
                    name="content"
                    rows="2"
                    class=(FORM_TEXT_INPUT_STYLE)
                {}
            }

            div class="md:col-span-2"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Task" }
            }
        }
    )
}

fn filter_form_view(filters: &TaskFilters) -> Markup {
    let selected_status = filters.status_filter();
    let deadline_options = [
        (DeadlineFilter::All, "all", "All deadlines"),
        (DeadlineFilter::Near, "near", "Due soon"),
        (DeadlineFilter::Overdue, "overdue", "Overdue"),
    ];

    html!(
        form
            id="task-filters"
            method="get"
            action=(endpoints::TASKS_VIEW)
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }
                input
                    id="search"
                    type="search"
                    name="search"
                    value=(filters.search)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="status-filter" class=(FORM_LABEL_STYLE) { "Status" }
                select id="status-filter" name="status" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="all" selected[selected_status.is_none()] { "All statuses" }

                    @for status in TaskStatus::ALL {
                        option
                            value=(status.as_str())
                            selected[selected_status == Some(status)]
                        {
                            (status.label())
                        }
                    }
                }
            }

            div
            {
                label for="deadline-filter" class=(FORM_LABEL_STYLE) { "Deadline" }
                select id="deadline-filter" name="deadline" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for (filter, value, label) in deadline_options {
                        option value=(value) selected[filters.deadline == filter] { (label) }
                    }
                }
            }

            button type="submit" class="px-4 py-2 bg-gray-200 dark:bg-gray-700 rounded"
            {
                "Filter"
            }

            @if filters.is_active() {
                a href=(endpoints::TASKS_VIEW) class="text-sm underline" { "Clear filters" }
            }
        }
    )
}

/// The table of tasks, swapped in place after a task is moved.
///
/// The reorder URL carries the active filters so the returned list is
/// filtered the same way as the page.
pub(super) fn task_list_view(tasks: &[Task], filters: &TaskFilters, today: Date) -> Markup {
    let visible_tasks = filter_tasks(tasks, filters, today);
    let reorder_url = format!("{}{}", endpoints::REORDER_TASKS, filters.to_query_string());

    html!(
        section
            id="task-list"
            data-reorder-url=(reorder_url)
            class="dark:bg-gray-800 w-full"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Start" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "End" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for task in &visible_tasks {
                        (task_row_view(task, today))
                    }

                    @if visible_tasks.is_empty() {
                        tr
                        {
                            td
                                colspan="5"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                @if tasks.is_empty() {
                                    "No tasks yet. Add one above to get started."
                                } @else {
                                    "No tasks match the current filters."
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

fn task_row_view(task: &Task, today: Date) -> Markup {
    let update_url = endpoints::format_endpoint(endpoints::PUT_TASK, task.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_TASK, task.id);
    let end_date_style = match deadline_state(task, today) {
        DeadlineState::Overdue => "text-red-600 dark:text-red-400",
        DeadlineState::Near => "text-amber-600 dark:text-amber-400",
        DeadlineState::Upcoming | DeadlineState::None => "",
    };

    html!(
        tr
            class={ "task-row cursor-move " (TABLE_ROW_STYLE) }
            draggable="true"
            data-task-id=(task.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                input
                    type="text"
                    name="title"
                    value=(task.title)
                    hx-put=(update_url)
                    hx-trigger="input changed"
                    hx-swap="none"
                    hx-target-error="#alert-container"
                    class=(FORM_TEXT_INPUT_STYLE);

                @if let Some(content) = &task.content {
                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400" { (content) }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                select
                    name="status"
                    hx-put=(update_url)
                    hx-trigger="change"
                    hx-swap="none"
                    hx-target-error="#alert-container"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for status in TaskStatus::ALL {
                        option value=(status.as_str()) selected[task.status == status]
                        {
                            (status.label())
                        }
                    }
                }
            }

            td class=(TABLE_CELL_STYLE) { (task.start_date) }

            td class={ (TABLE_CELL_STYLE) " " (end_date_style) }
            {
                input
                    type="date"
                    name="end_date"
                    value=[task.end_date]
                    hx-put=(update_url)
                    hx-trigger="change"
                    hx-swap="none"
                    hx-target-error="#alert-container"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(delete_url)
                    hx-confirm={ "Are you sure you want to delete '" (task.title) "'?" }
                    hx-target="closest tr"
                    hx-target-error="#alert-container"
                    hx-swap="delete"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    )
}

/// Posts the dragged task and the row it was dropped on to the reorder endpoint.
fn drag_and_drop_script() -> HeadElement {
    HeadElement::ScriptSource(PreEscaped(
        r#"
        document.addEventListener('DOMContentLoaded', function() {
            let draggedId = null;

            document.body.addEventListener('dragstart', function(event) {
                const row = event.target.closest('.task-row');
                if (!row) return;
                draggedId = row.dataset.taskId;
                event.dataTransfer.effectAllowed = 'move';
            });

            document.body.addEventListener('dragover', function(event) {
                const row = event.target.closest('.task-row');
                if (!row || draggedId === null) return;
                event.preventDefault();
                row.classList.add('drag-over');
            });

            document.body.addEventListener('dragleave', function(event) {
                const row = event.target.closest('.task-row');
                if (row) row.classList.remove('drag-over');
            });

            document.body.addEventListener('drop', function(event) {
                const row = event.target.closest('.task-row');
                if (!row || draggedId === null) return;
                event.preventDefault();
                row.classList.remove('drag-over');

                const targetId = row.dataset.taskId;
                const list = document.getElementById('task-list');
                const movedId = draggedId;
                draggedId = null;

                if (movedId === targetId) return;

                htmx.ajax('POST', list.dataset.reorderUrl, {
                    target: '#task-list',
                    swap: 'outerHTML',
                    values: { moved_id: movedId, target_id: targetId },
                });
            });
        });
        "#
        .to_owned(),
    ))
}

#[cfg(test)]
mod tasks_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        endpoints,
        task::{
            AutosaveQueue, NewTask, TaskStatus, TaskTitle, create_task, create_task_table,
            filter::TaskFilters,
        },
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button_with_text,
            assert_hx_endpoint, assert_status_ok, assert_valid_html, must_get_form,
            parse_html_document,
        },
        user::UserId,
    };

    use super::{TasksPageState, get_tasks_page};

    fn get_test_state() -> TasksPageState {
        let connection = Connection::open_in_memory().unwrap();
        create_task_table(&connection).unwrap();

        let user_id = UserId::new(1);
        let db_connection = Arc::new(Mutex::new(connection));

        TasksPageState {
            autosave: AutosaveQueue::spawn(user_id, db_connection.clone()),
            db_connection,
            local_timezone: "Etc/UTC".to_owned(),
            user_id,
        }
    }

    fn add_task(state: &TasksPageState, title: &str, status: TaskStatus) -> i64 {
        let mut new_task = NewTask::new(TaskTitle::new_unchecked(title), date!(2025 - 03 - 15));
        new_task.status = status;

        create_task(state.user_id, new_task, &state.db_connection.lock().unwrap())
            .unwrap()
            .id
    }

    fn row_ids(html: &scraper::Html) -> Vec<String> {
        html.select(&Selector::parse("tr.task-row").unwrap())
            .map(|row| row.value().attr("data-task-id").unwrap_or_default().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn render_page_with_new_task_form() {
        let state = get_test_state();

        let response = get_tasks_page(State(state), Query(TaskFilters::default()))
            .await
            .expect("Could not render tasks page");

        assert_status_ok(&response);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_TASK, "hx-post");
        assert_form_input(&form, "title", "text");
        assert_form_input(&form, "start_date", "date");
        assert_form_submit_button_with_text(&form, "Add Task");
    }

    #[tokio::test]
    async fn rows_are_in_sort_key_order_and_draggable() {
        let state = get_test_state();
        let first = add_task(&state, "First", TaskStatus::Todo);
        let second = add_task(&state, "Second", TaskStatus::Todo);

        let response = get_tasks_page(State(state), Query(TaskFilters::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(row_ids(&html), vec![first.to_string(), second.to_string()]);

        let row = html
            .select(&Selector::parse("tr.task-row").unwrap())
            .next()
            .unwrap();
        assert_eq!(row.value().attr("draggable"), Some("true"));

        let title_input = row
            .select(&Selector::parse("input[name=title]").unwrap())
            .next()
            .expect("No inline title input");
        assert_eq!(
            title_input.value().attr("hx-put"),
            Some(endpoints::format_endpoint(endpoints::PUT_TASK, first).as_str())
        );
    }

    #[tokio::test]
    async fn status_filter_hides_other_tasks() {
        let state = get_test_state();
        add_task(&state, "Waiting", TaskStatus::Todo);
        let blocked = add_task(&state, "Stuck", TaskStatus::Blocked);
        let filters = TaskFilters {
            status: "blocked".to_owned(),
            ..Default::default()
        };

        let response = get_tasks_page(State(state), Query(filters)).await.unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(row_ids(&html), vec![blocked.to_string()]);

        let list = html
            .select(&Selector::parse("#task-list").unwrap())
            .next()
            .unwrap();
        assert_eq!(
            list.value().attr("data-reorder-url"),
            Some("/api/tasks/reorder?search=&status=blocked&deadline=all")
        );
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error() {
        let mut state = get_test_state();
        state.local_timezone = "Not/A_Zone".to_owned();

        let result = get_tasks_page(State(state), Query(TaskFilters::default())).await;

        assert!(result.is_err());
    }
}
