//! Chart generation and rendering for the dashboard.
//!
//! Charts are built as ECharts options with charming and initialised by a
//! small script once the page has loaded:
//! - **Income**: income per month of the year, the current month highlighted
//! - **Daily expenses**: expenses per day of the week, today highlighted
//! - **Expenses by category**: share of all expenses per category

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, ItemStyle, JsFunction, Tooltip, Trigger,
    },
    series::{Pie, bar},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::{aggregation::CategoryTotal, bucketing::Bucket},
    html::HeadElement,
};

const HIGHLIGHT_COLOR: &str = "#22c55e";
const MUTED_COLOR: &str = "#7d8d86";
const EXPENSE_COLOR: &str = "#ef4444";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates the script that initialises each chart with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chart = echarts.init(document.getElementById("{}"));
                    chart.setOption({});

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    HeadElement::ScriptSource(PreEscaped(format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    )))
}

/// Income per month with the current month drawn in a brighter colour.
pub(super) fn monthly_income_chart(buckets: &[Bucket]) -> Chart {
    highlighted_bar_chart(
        "Income",
        "By month of this year",
        buckets,
        ("This month", HIGHLIGHT_COLOR),
        ("Other months", MUTED_COLOR),
    )
}

/// Expenses per weekday with today drawn in a brighter colour.
pub(super) fn weekday_expenses_chart(buckets: &[Bucket]) -> Chart {
    highlighted_bar_chart(
        "Daily expenses",
        "By day of the week",
        buckets,
        ("Today", EXPENSE_COLOR),
        ("Other days", MUTED_COLOR),
    )
}

pub(super) fn category_chart(totals: &[CategoryTotal]) -> Chart {
    let data: Vec<(f64, &str)> = totals
        .iter()
        .map(|total| (total.total, total.category.as_str()))
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by category")
                .subtext(if data.is_empty() {
                    "No expenses recorded yet"
                } else {
                    "All time"
                }),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("1%"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

/// A bar chart where the current period is a separate stacked series, so it
/// gets its own colour and legend entry.
fn highlighted_bar_chart(
    title: &str,
    subtitle: &str,
    buckets: &[Bucket],
    (current_name, current_color): (&str, &str),
    (other_name, other_color): (&str, &str),
) -> Chart {
    let labels: Vec<String> = buckets.iter().map(|bucket| bucket.label.clone()).collect();
    let (current, other) = split_current_period(buckets);

    Chart::new()
        .title(Title::new().text(title).subtext(subtitle))
        .tooltip(currency_tooltip())
        .legend(Legend::new().right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name(other_name)
                .stack(title)
                .item_style(ItemStyle::new().color(other_color))
                .data(other),
        )
        .series(
            bar::Bar::new()
                .name(current_name)
                .stack(title)
                .item_style(ItemStyle::new().color(current_color))
                .data(current),
        )
}

/// Split bucket values into the current period and the rest, zero filling
/// the other series at each slot.
fn split_current_period(buckets: &[Bucket]) -> (Vec<f64>, Vec<f64>) {
    buckets
        .iter()
        .map(|bucket| {
            if bucket.is_current_period {
                (bucket.value, 0.0)
            } else {
                (0.0, bucket.value)
            }
        })
        .unzip()
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
