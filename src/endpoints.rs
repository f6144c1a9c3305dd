//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/tasks/{task_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page with the finance overview.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for listing and reordering tasks.
pub const TASKS_VIEW: &str = "/tasks";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to record income.
pub const POST_INCOME: &str = "/api/income";
/// The route to record an expense.
pub const POST_EXPENSE: &str = "/api/expenses";
/// The route to create a savings goal.
pub const POST_GOAL: &str = "/api/goals";
/// The route to create a task.
pub const POST_TASK: &str = "/api/tasks";
/// The route to edit a task inline.
pub const PUT_TASK: &str = "/api/tasks/{task_id}";
/// The route to delete a task.
pub const DELETE_TASK: &str = "/api/tasks/{task_id}";
/// The route to move a task by dropping it onto another task.
pub const REORDER_TASKS: &str = "/api/tasks/reorder";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/tasks/{task_id}', '{task_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
