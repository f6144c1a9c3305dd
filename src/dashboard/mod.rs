//! Dashboard module
//!
//! Provides an overview page with the user's totals, charts of income and
//! expenses, savings goals and the forms for recording new entries.

mod aggregation;
mod bucketing;
mod cards;
mod charts;
mod forms;
mod goal;
mod handlers;
mod profile;
mod records;
mod tables;

pub use forms::{create_expense_endpoint, create_goal_endpoint, create_income_endpoint};
pub use goal::{GoalId, GoalName, create_goal_table};
pub use handlers::get_dashboard_page;
pub use profile::{NewExpense, add_expense, add_goal, add_income, create_profile_table};
pub use records::{Amount, create_record_tables};
