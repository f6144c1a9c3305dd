//! Narrowing the task list by search term, status and deadline.

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::task::{Task, TaskStatus};

/// Tasks due within this many days of today count as having a near deadline.
pub const NEAR_DEADLINE_DAYS: i64 = 3;

/// How close a task is to its end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineState {
    /// The task has no end date.
    None,
    /// The end date is more than [NEAR_DEADLINE_DAYS] away.
    Upcoming,
    /// The end date is today or within [NEAR_DEADLINE_DAYS].
    Near,
    /// The end date has passed.
    Overdue,
}

/// Classify `task` by its end date relative to `today`.
pub fn deadline_state(task: &Task, today: Date) -> DeadlineState {
    match task.end_date {
        None => DeadlineState::None,
        Some(end_date) if end_date < today => DeadlineState::Overdue,
        Some(end_date) if end_date - today <= Duration::days(NEAR_DEADLINE_DAYS) => {
            DeadlineState::Near
        }
        Some(_) => DeadlineState::Upcoming,
    }
}

/// The deadline options offered in the filter form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineFilter {
    #[default]
    All,
    Near,
    Overdue,
}

/// The query parameters of the task list page.
///
/// Empty or missing parameters do not filter anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilters {
    #[serde(default)]
    pub search: String,
    /// "all", empty, or one of the task status values.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub deadline: DeadlineFilter,
}

impl TaskFilters {
    /// Whether any filter would hide tasks.
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty()
            || self.status_filter().is_some()
            || self.deadline != DeadlineFilter::All
    }

    /// The status to filter on, `None` for all statuses.
    ///
    /// Unknown status values are ignored rather than hiding every task.
    pub fn status_filter(&self) -> Option<TaskStatus> {
        self.status.parse().ok()
    }

    /// The parameters as a query string, e.g. "?search=rent&status=todo&deadline=all".
    pub fn to_query_string(&self) -> String {
        if !self.is_active() {
            return String::new();
        }

        let status = self
            .status_filter()
            .map(|status| status.as_str())
            .unwrap_or("all");
        let deadline = match self.deadline {
            DeadlineFilter::All => "all",
            DeadlineFilter::Near => "near",
            DeadlineFilter::Overdue => "overdue",
        };

        match serde_urlencoded::to_string([
            ("search", self.search.trim()),
            ("status", status),
            ("deadline", deadline),
        ]) {
            Ok(query) => format!("?{query}"),
            Err(error) => {
                tracing::error!("Could not encode task filters {self:?}: {error}");
                String::new()
            }
        }
    }
}

/// Keep the tasks that match every active filter, in their original order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filters: &TaskFilters, today: Date) -> Vec<&'a Task> {
    let search = filters.search.trim().to_lowercase();
    let status = filters.status_filter();

    tasks
        .iter()
        .filter(|task| search.is_empty() || matches_search(task, &search))
        .filter(|task| status.is_none_or(|status| task.status == status))
        .filter(|task| match filters.deadline {
            DeadlineFilter::All => true,
            DeadlineFilter::Near => deadline_state(task, today) == DeadlineState::Near,
            DeadlineFilter::Overdue => deadline_state(task, today) == DeadlineState::Overdue,
        })
        .collect()
}

fn matches_search(task: &Task, lowercase_search: &str) -> bool {
    task.title.as_ref().to_lowercase().contains(lowercase_search)
        || task
            .content
            .as_deref()
            .is_some_and(|content| content.to_lowercase().contains(lowercase_search))
}

#[cfg(test)]
mod filter_tasks_tests {
    use time::{OffsetDateTime, macros::date};

    use crate::task::{Task, TaskStatus, TaskTitle};

    use super::{DeadlineFilter, DeadlineState, TaskFilters, deadline_state, filter_tasks};

    fn task(id: i64, title: &str, status: TaskStatus, end_date: Option<time::Date>) -> Task {
        Task {
            id,
            title: TaskTitle::new_unchecked(title),
            content: None,
            status,
            start_date: date!(2025 - 03 - 01),
            end_date,
            sort_key: id as f64,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn ids(tasks: &[&Task]) -> Vec<i64> {
        tasks.iter().map(|task| task.id).collect()
    }

    const TODAY: time::Date = date!(2025 - 03 - 15);

    #[test]
    fn deadline_states() {
        let cases = [
            (None, DeadlineState::None),
            (Some(date!(2025 - 03 - 14)), DeadlineState::Overdue),
            (Some(date!(2025 - 03 - 15)), DeadlineState::Near),
            (Some(date!(2025 - 03 - 18)), DeadlineState::Near),
            (Some(date!(2025 - 03 - 19)), DeadlineState::Upcoming),
        ];

        for (end_date, want) in cases {
            let got = deadline_state(&task(1, "Foo", TaskStatus::Todo, end_date), TODAY);
            assert_eq!(got, want, "end date {end_date:?}");
        }
    }

    #[test]
    fn no_filters_keeps_everything_in_order() {
        let tasks = [
            task(1, "A", TaskStatus::Todo, None),
            task(2, "B", TaskStatus::Done, None),
        ];

        let filtered = filter_tasks(&tasks, &TaskFilters::default(), TODAY);

        assert_eq!(ids(&filtered), vec![1, 2]);
    }

    #[test]
    fn search_is_case_insensitive_and_checks_content() {
        let mut with_content = task(2, "Groceries", TaskStatus::Todo, None);
        with_content.content = Some("Pay the RENT too".to_owned());
        let tasks = [
            task(1, "Rent", TaskStatus::Todo, None),
            with_content,
            task(3, "Gym", TaskStatus::Todo, None),
        ];
        let filters = TaskFilters {
            search: " rent ".to_owned(),
            ..Default::default()
        };

        assert_eq!(ids(&filter_tasks(&tasks, &filters, TODAY)), vec![1, 2]);
    }

    #[test]
    fn status_filter() {
        let tasks = [
            task(1, "A", TaskStatus::Todo, None),
            task(2, "B", TaskStatus::Blocked, None),
        ];
        let filters = TaskFilters {
            status: "blocked".to_owned(),
            ..Default::default()
        };

        assert_eq!(ids(&filter_tasks(&tasks, &filters, TODAY)), vec![2]);
    }

    #[test]
    fn unknown_status_does_not_filter() {
        let tasks = [task(1, "A", TaskStatus::Todo, None)];
        let filters = TaskFilters {
            status: "all".to_owned(),
            ..Default::default()
        };

        assert_eq!(ids(&filter_tasks(&tasks, &filters, TODAY)), vec![1]);
        assert!(!filters.is_active());
    }

    #[test]
    fn deadline_filters() {
        let tasks = [
            task(1, "Overdue", TaskStatus::Todo, Some(date!(2025 - 03 - 10))),
            task(2, "Near", TaskStatus::Todo, Some(date!(2025 - 03 - 16))),
            task(3, "Later", TaskStatus::Todo, Some(date!(2025 - 04 - 16))),
            task(4, "Whenever", TaskStatus::Todo, None),
        ];
        let near = TaskFilters {
            deadline: DeadlineFilter::Near,
            ..Default::default()
        };
        let overdue = TaskFilters {
            deadline: DeadlineFilter::Overdue,
            ..Default::default()
        };

        assert_eq!(ids(&filter_tasks(&tasks, &near, TODAY)), vec![2]);
        assert_eq!(ids(&filter_tasks(&tasks, &overdue, TODAY)), vec![1]);
    }

    #[test]
    fn query_string_round_trips_active_filters() {
        let filters = TaskFilters {
            search: "rent & bills".to_owned(),
            status: "in_progress".to_owned(),
            deadline: DeadlineFilter::Near,
        };

        assert_eq!(
            filters.to_query_string(),
            "?search=rent+%26+bills&status=in_progress&deadline=near"
        );
        assert_eq!(TaskFilters::default().to_query_string(), "");
    }

    #[test]
    fn query_string_encodes_non_ascii_search() {
        let filters = TaskFilters {
            search: " café ".to_owned(),
            status: "bogus".to_owned(),
            deadline: DeadlineFilter::All,
        };

        assert_eq!(
            filters.to_query_string(),
            "?search=caf%C3%A9&status=all&deadline=all"
        );
    }
}
