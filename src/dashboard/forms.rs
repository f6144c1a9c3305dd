//! Forms and endpoints for recording income, expenses and goals.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Deserializer};
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{
    AppState, Error,
    dashboard::{
        GoalId,
        goal::{Goal, GoalName},
        profile::{NewExpense, add_expense, add_goal, add_income},
        records::Amount,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    timezone::get_local_offset,
    user::UserId,
};

/// The format of `datetime-local` inputs, e.g. "2025-03-15T10:00".
const FORM_DATETIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
/// Browsers add seconds when the step attribute allows them.
const FORM_DATETIME_SECONDS_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// The state needed for the income, expense and goal endpoints.
#[derive(Debug, Clone)]
pub struct RecordFormState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub user_id: UserId,
}

impl FromRef<AppState> for RecordFormState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            user_id: state.user_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IncomeFormData {
    pub amount: f64,
    /// A `datetime-local` value in the local timezone, empty for now.
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseFormData {
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_goal_id")]
    pub goal_id: Option<GoalId>,
}

#[derive(Debug, Deserialize)]
pub struct GoalFormData {
    pub name: String,
    pub price: f64,
}

/// An empty select value means "no goal".
fn deserialize_goal_id<'de, D>(deserializer: D) -> Result<Option<GoalId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    let value = value.trim();

    if value.is_empty() {
        return Ok(None);
    }

    value
        .parse::<GoalId>()
        .map(Some)
        .map_err(|_| serde::de::Error::custom(format!("invalid goal id \"{value}\"")))
}

/// Parse a `datetime-local` form value in `local_offset`, `None` when blank.
fn parse_form_datetime(
    text: &str,
    local_offset: UtcOffset,
) -> Result<Option<OffsetDateTime>, Error> {
    let text = text.trim();

    if text.is_empty() {
        return Ok(None);
    }

    PrimitiveDateTime::parse(text, FORM_DATETIME_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(text, FORM_DATETIME_SECONDS_FORMAT))
        .map(|date_time| Some(date_time.assume_offset(local_offset)))
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn local_offset(local_timezone: &str) -> Result<UtcOffset, Error> {
    get_local_offset(local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", local_timezone);
        Error::InvalidTimezoneError(local_timezone.to_owned())
    })
}

fn redirect_to_dashboard() -> Response {
    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Record income and add it to the balance.
pub async fn create_income_endpoint(
    State(state): State<RecordFormState>,
    Form(form): Form<IncomeFormData>,
) -> Response {
    let parsed = Amount::new(form.amount).and_then(|amount| {
        let date = parse_form_datetime(&form.date, local_offset(&state.local_timezone)?)?;
        Ok((amount, date))
    });

    let (amount, date) = match parsed {
        Ok(parsed) => parsed,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match add_income(state.user_id, amount, date, &connection) {
        Ok(_) => redirect_to_dashboard(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while recording income: {error}");
            error.into_alert_response()
        }
    }
}

/// Record an expense, optionally putting it towards a goal.
pub async fn create_expense_endpoint(
    State(state): State<RecordFormState>,
    Form(form): Form<ExpenseFormData>,
) -> Response {
    let parsed = Amount::new(form.amount).and_then(|amount| {
        Ok(NewExpense {
            amount,
            category: form.category,
            date: parse_form_datetime(&form.date, local_offset(&state.local_timezone)?)?,
            goal_id: form.goal_id,
        })
    });

    let expense = match parsed {
        Ok(expense) => expense,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match add_expense(state.user_id, expense, &connection) {
        Ok(_) => redirect_to_dashboard(),
        Err(Error::UnknownGoal(goal_id)) => Error::UnknownGoal(goal_id).into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while recording an expense: {error}");
            error.into_alert_response()
        }
    }
}

/// Create a savings goal.
pub async fn create_goal_endpoint(
    State(state): State<RecordFormState>,
    Form(form): Form<GoalFormData>,
) -> Response {
    let parsed = GoalName::new(&form.name)
        .and_then(|name| Amount::new(form.price).map(|price| (name, price)));

    let (name, price) = match parsed {
        Ok(parsed) => parsed,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match add_goal(state.user_id, &name, price, &connection) {
        Ok(_) => redirect_to_dashboard(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a goal: {error}");
            error.into_alert_response()
        }
    }
}

/// Renders the three record forms side by side.
pub(super) fn record_forms_view(goals: &[Goal]) -> Markup {
    html! {
        section id="record-forms" class="w-full mx-auto mb-8" {
            div class="grid grid-cols-1 lg:grid-cols-3 gap-4" {
                (income_form_view())
                (expense_form_view(goals))
                (goal_form_view())
            }
        }
    }
}

fn amount_input(id: &str, name: &str, label: &str) -> Markup {
    html! {
        div {
            label for=(id) class=(FORM_LABEL_STYLE) { (label) }
            input
                id=(id)
                type="number"
                name=(name)
                min="0.01"
                step="0.01"
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn income_form_view() -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_INCOME)
            hx-target-error="#alert-container"
            class={ (CARD_STYLE) " space-y-4" }
        {
            h3 class="text-xl font-semibold" { "Add income" }

            (amount_input("income-amount", "amount", "Amount"))

            div {
                label for="income-date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    id="income-date"
                    type="datetime-local"
                    name="date"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add income" }
        }
    }
}

fn expense_form_view(goals: &[Goal]) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_EXPENSE)
            hx-target-error="#alert-container"
            class={ (CARD_STYLE) " space-y-4" }
        {
            h3 class="text-xl font-semibold" { "Add expense" }

            (amount_input("expense-amount", "amount", "Amount"))

            div {
                label for="expense-category" class=(FORM_LABEL_STYLE) { "Category" }
                input
                    id="expense-category"
                    type="text"
                    name="category"
                    placeholder="e.g. Food"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div {
                label for="expense-goal" class=(FORM_LABEL_STYLE) { "Goal" }
                select id="expense-goal" name="goal_id" class=(FORM_TEXT_INPUT_STYLE) {
                    option value="" { "None" }
                    @for goal in goals {
                        option value=(goal.id) { (goal.name) }
                    }
                }
            }

            div {
                label for="expense-date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    id="expense-date"
                    type="datetime-local"
                    name="date"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add expense" }
        }
    }
}

fn goal_form_view() -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_GOAL)
            hx-target-error="#alert-container"
            class={ (CARD_STYLE) " space-y-4" }
        {
            h3 class="text-xl font-semibold" { "Add goal" }

            div {
                label for="goal-name" class=(FORM_LABEL_STYLE) { "Name" }
                input
                    id="goal-name"
                    type="text"
                    name="name"
                    placeholder="e.g. New bike"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (amount_input("goal-price", "price", "Target"))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add goal" }
        }
    }
}


#[cfg(test)]
mod record_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        dashboard::{
            goal::get_goals,
            profile::get_profile,
            records::{get_balance_entries, get_expenses},
        },
        db::initialize,
        endpoints,
        test_utils::{assert_hx_redirect, assert_valid_html, parse_html_fragment},
        user::UserId,
    };

    use super::{
        ExpenseFormData, GoalFormData, IncomeFormData, RecordFormState, create_expense_endpoint,
        create_goal_endpoint, create_income_endpoint,
    };

    fn get_test_state() -> RecordFormState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        RecordFormState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
            user_id: UserId::new(1),
        }
    }

    #[tokio::test]
    async fn income_is_recorded_with_given_date() {
        let state = get_test_state();
        let form = IncomeFormData {
            amount: 100.0,
            date: "2025-03-15T10:00".to_owned(),
        };

        let response = create_income_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let entries = get_balance_entries(state.user_id, &connection).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, datetime!(2025-03-15 10:00:00 UTC));
        assert_eq!(get_profile(state.user_id, &connection).unwrap().current_balance, 100.0);
    }

    #[tokio::test]
    async fn non_positive_income_is_rejected() {
        let state = get_test_state();
        let form = IncomeFormData {
            amount: -5.0,
            date: String::new(),
        };

        let response = create_income_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert!(html.html().contains("Invalid amount"));
        assert!(
            get_balance_entries(state.user_id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn invalid_timezone_is_server_error() {
        let mut state = get_test_state();
        state.local_timezone = "Not/A_Zone".to_owned();
        let form = IncomeFormData {
            amount: 5.0,
            date: String::new(),
        };

        let response = create_income_endpoint(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn expense_towards_goal_is_recorded() {
        let state = get_test_state();
        create_goal_endpoint(
            State(state.clone()),
            Form(GoalFormData {
                name: "Bike".to_owned(),
                price: 500.0,
            }),
        )
        .await;
        let goal_id = get_goals(state.user_id, &state.db_connection.lock().unwrap()).unwrap()[0].id;
        let form = ExpenseFormData {
            amount: 25.0,
            category: String::new(),
            date: String::new(),
            goal_id: Some(goal_id),
        };

        let response = create_expense_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let expenses = get_expenses(state.user_id, &connection).unwrap();
        assert_eq!(expenses[0].category, "Bike");
        assert_eq!(get_goals(state.user_id, &connection).unwrap()[0].balance, 25.0);
    }

    #[tokio::test]
    async fn expense_with_unknown_goal_is_rejected() {
        let state = get_test_state();
        let form = ExpenseFormData {
            amount: 25.0,
            category: "Food".to_owned(),
            date: String::new(),
            goal_id: Some(42),
        };

        let response = create_expense_endpoint(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert!(html.html().contains("Could not find a goal with the ID 42."));
    }

    #[tokio::test]
    async fn goal_needs_a_name() {
        let state = get_test_state();
        let form = GoalFormData {
            name: "   ".to_owned(),
            price: 100.0,
        };

        let response = create_goal_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            get_goals(state.user_id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }
}
