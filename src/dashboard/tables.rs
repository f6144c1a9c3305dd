//! The transaction history table on the dashboard.

use maud::{Markup, html};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    dashboard::records::{BalanceEntry, Expense, format_display_timestamp},
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
};

/// How many of the most recent records the history table shows.
const HISTORY_LIMIT: usize = 50;

const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryKind {
    Income,
    Expense,
}

struct HistoryRow<'a> {
    kind: HistoryKind,
    date: OffsetDateTime,
    category: &'a str,
    amount: f64,
}

/// Merge income and expenses into one list, newest first.
fn history_rows<'a>(entries: &'a [BalanceEntry], expenses: &'a [Expense]) -> Vec<HistoryRow<'a>> {
    let income = entries.iter().map(|entry| HistoryRow {
        kind: HistoryKind::Income,
        date: entry.date,
        category: "Income",
        amount: entry.amount,
    });
    let spent = expenses.iter().map(|expense| HistoryRow {
        kind: HistoryKind::Expense,
        date: expense.date,
        category: &expense.category,
        amount: expense.amount,
    });

    let mut rows: Vec<HistoryRow> = income.chain(spent).collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows.truncate(HISTORY_LIMIT);
    rows
}

/// Renders the most recent income and expenses.
pub(super) fn history_table_view(
    entries: &[BalanceEntry],
    expenses: &[Expense],
    local_offset: UtcOffset,
) -> Markup {
    let rows = history_rows(entries, expenses);

    html! {
        section id="history" class="w-full mx-auto mb-8" {
            h3 class="text-xl font-semibold mb-4" { "Transaction history" }

            div class="overflow-x-auto rounded-lg shadow" {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                    thead class=(TABLE_HEADER_STYLE) {
                        tr {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        }
                    }
                    tbody {
                        @for row in &rows {
                            tr class=(TABLE_ROW_STYLE) {
                                td class=(TABLE_CELL_STYLE) {
                                    (format_display_timestamp(row.date, local_offset).unwrap_or_default())
                                }
                                td class=(TABLE_CELL_STYLE) {
                                    @match row.kind {
                                        HistoryKind::Income => { "Income" }
                                        HistoryKind::Expense => { "Expense" }
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (row.category) }
                                td class={
                                    (TABLE_CELL_STYLE) " "
                                    (if row.kind == HistoryKind::Income { TABLE_CELL_GREEN_STYLE } else { TABLE_CELL_RED_STYLE })
                                } {
                                    (format_currency(row.amount))
                                }
                            }
                        }

                        @if rows.is_empty() {
                            tr class=(TABLE_ROW_STYLE) {
                                td colspan="4" class={ (TABLE_CELL_STYLE) " text-center" } {
                                    "Nothing recorded yet."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
