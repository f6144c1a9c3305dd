//! Dashboard HTTP handler and page rendering.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error,
    dashboard::{
        aggregation::expenses_by_category,
        bucketing::{MONTH_LABELS, WEEKDAY_LABELS, bucket_by_month, bucket_by_weekday},
        cards::{goals_view, summary_cards_view, weekday_heatmap_view},
        charts::{
            DashboardChart, category_chart, charts_script, charts_view, monthly_income_chart,
            weekday_expenses_chart,
        },
        forms::record_forms_view,
        goal::{Goal, get_goals},
        profile::{Profile, get_profile},
        records::{
            BalanceEntry, Expense, get_balance_entries, get_expenses, to_amount_records,
        },
        tables::history_table_view,
    },
    endpoints,
    html::{HeadElement, base},
    navigation::NavBar,
    timezone::get_local_offset,
    user::UserId,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading the user's records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub user_id: UserId,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            user_id: state.user_id,
        }
    }
}

/// Everything read from the database to render the dashboard.
struct DashboardData {
    profile: Profile,
    entries: Vec<BalanceEntry>,
    expenses: Vec<Expense>,
    goals: Vec<Goal>,
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let data = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        load_dashboard_data(state.user_id, &connection)?
    };

    Ok(dashboard_view(&data, local_offset, today).into_response())
}

fn load_dashboard_data(user_id: UserId, connection: &Connection) -> Result<DashboardData, Error> {
    let profile = get_profile(user_id, connection)
        .inspect_err(|error| tracing::error!("could not get profile: {error}"))?;
    let entries = get_balance_entries(user_id, connection)
        .inspect_err(|error| tracing::error!("could not get balance history: {error}"))?;
    let expenses = get_expenses(user_id, connection)
        .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;
    let goals = get_goals(user_id, connection)
        .inspect_err(|error| tracing::error!("could not get goals: {error}"))?;

    Ok(DashboardData {
        profile,
        entries,
        expenses,
        goals,
    })
}

fn dashboard_view(data: &DashboardData, local_offset: UtcOffset, today: Date) -> Markup {
    let income_buckets = bucket_by_month(
        &to_amount_records(&data.entries, local_offset),
        &MONTH_LABELS,
        today,
    );
    let weekday_buckets = bucket_by_weekday(
        &to_amount_records(&data.expenses, local_offset),
        &WEEKDAY_LABELS,
        today,
    );
    let category_totals = expenses_by_category(&data.expenses);

    let charts = [
        DashboardChart {
            id: "income-chart",
            options: monthly_income_chart(&income_buckets).to_string(),
        },
        DashboardChart {
            id: "category-chart",
            options: category_chart(&category_totals).to_string(),
        },
        DashboardChart {
            id: "weekday-expenses-chart",
            options: weekday_expenses_chart(&weekday_buckets).to_string(),
        },
    ];

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (summary_cards_view(&data.profile, local_offset))
            (record_forms_view(&data.goals))
            (charts_view(&charts))
            (weekday_heatmap_view(&weekday_buckets))
            (goals_view(&data.goals))
            (history_table_view(&data.entries, &data.expenses, local_offset))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&charts),
    ];

    base("Dashboard", &scripts, &content)
}
