//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    dashboard::{
        create_expense_endpoint, create_goal_endpoint, create_income_endpoint, get_dashboard_page,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    task::{
        create_task_endpoint, delete_task_endpoint, get_tasks_page, reorder_tasks_endpoint,
        update_task_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TASKS_VIEW, get(get_tasks_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(endpoints::POST_INCOME, post(create_income_endpoint))
        .route(endpoints::POST_EXPENSE, post(create_expense_endpoint))
        .route(endpoints::POST_GOAL, post(create_goal_endpoint))
        .route(endpoints::POST_TASK, post(create_task_endpoint))
        .route(endpoints::REORDER_TASKS, post(reorder_tasks_endpoint))
        // PUT_TASK and DELETE_TASK share a path.
        .route(
            endpoints::PUT_TASK,
            put(update_task_endpoint).delete(delete_task_endpoint),
        );

    page_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
