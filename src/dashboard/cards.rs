//! Card components for the dashboard.
//!
//! Provides:
//! - Summary cards for total income, total expenses and the current balance
//! - A heatmap of expenses per day of the week
//! - Progress bars for each savings goal

use maud::{Markup, html};
use time::UtcOffset;

use crate::{
    dashboard::{
        aggregation::bucket_intensity, bucketing::Bucket, goal::Goal, profile::Profile,
        records::format_display_timestamp,
    },
    html::{CARD_STYLE, format_currency},
};

const AMOUNT_GREEN_STYLE: &str = "text-2xl font-bold text-green-600 dark:text-green-400";
const AMOUNT_RED_STYLE: &str = "text-2xl font-bold text-red-600 dark:text-red-400";

/// Renders the income, expense and balance cards.
pub(super) fn summary_cards_view(profile: &Profile, local_offset: UtcOffset) -> Markup {
    let balance_date = profile
        .current_balance_date
        .and_then(|date| format_display_timestamp(date, local_offset));

    html! {
        section id="summary" class="w-full mx-auto mb-8" {
            div class="grid grid-cols-1 lg:grid-cols-3 gap-4" {
                (summary_card("Total income", profile.total_income, AMOUNT_GREEN_STYLE, None))
                (summary_card("Total expenses", profile.total_expense, AMOUNT_RED_STYLE, None))
                (summary_card(
                    "Balance",
                    profile.current_balance,
                    AMOUNT_GREEN_STYLE,
                    balance_date.as_deref(),
                ))
            }
        }
    }
}

fn summary_card(title: &str, amount: f64, amount_style: &str, footnote: Option<&str>) -> Markup {
    html! {
        article class=(CARD_STYLE) aria-label=(format!("{title}: {}", format_currency(amount))) {
            p class="text-lg" { (title) }
            p class={ "mt-4 " (amount_style) } { (format_currency(amount)) }
            @if let Some(footnote) = footnote {
                p class="mt-1 text-sm text-gray-600 dark:text-gray-400" {
                    "Updated " (footnote)
                }
            }
        }
    }
}

/// Renders the weekday expense totals as a row of cells shaded by amount.
pub(super) fn weekday_heatmap_view(buckets: &[Bucket]) -> Markup {
    html! {
        section id="daily-expenses" class={ "w-full mx-auto mb-8 " (CARD_STYLE) } {
            h3 class="text-xl font-semibold mb-4" { "Daily expenses" }

            div class="grid grid-cols-7 gap-2" {
                @for bucket in buckets {
                    div
                        class=(heatmap_cell_style(bucket))
                        style=(format!(
                            "background-color: rgba(239, 68, 68, {:.2})",
                            bucket_intensity(bucket, buckets)
                        ))
                        data-current[bucket.is_current_period]
                    {
                        (bucket.label)
                        div class="text-sm mt-1" { (format_currency(bucket.value)) }
                    }
                }
            }
        }
    }
}

fn heatmap_cell_style(bucket: &Bucket) -> &'static str {
    if bucket.is_current_period {
        "p-4 text-center rounded-md font-semibold ring-2 ring-blue-500"
    } else {
        "p-4 text-center rounded-md font-semibold"
    }
}

/// Renders a progress bar for each goal, or a hint when there are none.
pub(super) fn goals_view(goals: &[Goal]) -> Markup {
    html! {
        section id="goals" class={ "w-full mx-auto mb-8 " (CARD_STYLE) } {
            h3 class="text-xl font-semibold mb-4" { "Active goals" }

            @if goals.is_empty() {
                p class="text-gray-600 dark:text-gray-400" {
                    "No goals yet. Add a goal below to start saving towards it."
                }
            }

            @for goal in goals {
                (goal_progress(goal))
            }
        }
    }
}

fn goal_progress(goal: &Goal) -> Markup {
    let percent = goal.progress_percent().floor();

    html! {
        div class="mb-5 goal" {
            p class="font-semibold mb-1" { (goal.name) }
            div
                class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-4 mb-2"
                role="progressbar"
                aria-valuenow=(percent)
                aria-valuemin="0"
                aria-valuemax="100"
            {
                @if percent > 0.0 {
                    div
                        class="bg-yellow-500 h-4 rounded-full transition-all"
                        style=(format!("width: {percent:.0}%"))
                    {}
                }
            }
            p class="text-sm" {
                (format_currency(goal.balance)) " of " (format_currency(goal.price))
                " (" (percent) "%)"
            }
        }
    }
}
