//! Core task domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, database_id::DatabaseId, task::ordering::SortKeyed};

/// The format used by HTML date inputs, e.g. "2025-03-15".
pub const FORM_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Database identifier for a task.
pub type TaskId = DatabaseId;

/// A validated, non-empty task title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Create a task title from `title` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyTaskTitle] if `title` is empty or only whitespace.
    pub fn new(title: &str) -> Result<Self, Error> {
        let title = title.trim();

        if title.is_empty() {
            Err(Error::EmptyTaskTitle)
        } else {
            Ok(Self(title.to_string()))
        }
    }

    /// Create a task title without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(title: &str) -> Self {
        Self(title.to_string())
    }
}

impl AsRef<str> for TaskTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for TaskTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a task is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
    /// Waiting on something else.
    Blocked,
}

impl TaskStatus {
    /// Every status in the order they are offered in forms.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Blocked,
    ];

    /// The value stored in the database and sent in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// The human readable name of the status.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
            TaskStatus::Blocked => "Blocked",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidTaskStatus(s.to_owned()))
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A task in the user's task list.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: TaskTitle,
    pub content: Option<String>,
    pub status: TaskStatus,
    pub start_date: Date,
    pub end_date: Option<Date>,
    /// The position of the task in the list, lower keys come first.
    pub sort_key: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl SortKeyed for Task {
    type Id = TaskId;

    fn id(&self) -> &TaskId {
        &self.id
    }

    fn sort_key(&self) -> f64 {
        self.sort_key
    }
}

/// The fields needed to create a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    /// The task's name.
    pub title: TaskTitle,
    /// Optional notes.
    pub content: Option<String>,
    /// The starting status, usually [TaskStatus::Todo].
    pub status: TaskStatus,
    /// When work on the task starts.
    pub start_date: Date,
    /// The deadline, if there is one.
    pub end_date: Option<Date>,
}

impl NewTask {
    /// A task with status [TaskStatus::Todo], no content and no deadline.
    pub fn new(title: TaskTitle, start_date: Date) -> Self {
        Self {
            title,
            content: None,
            status: TaskStatus::default(),
            start_date,
            end_date: None,
        }
    }
}

/// A partial edit of a task, `None` fields are left unchanged.
///
/// For the optional task fields the inner `None` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<TaskTitle>,
    pub content: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub start_date: Option<Date>,
    pub end_date: Option<Option<Date>>,
}

impl TaskUpdate {
    /// Combine two edits of the same task, fields set in `later` win.
    pub fn merge(&mut self, later: TaskUpdate) {
        if later.title.is_some() {
            self.title = later.title;
        }
        if later.content.is_some() {
            self.content = later.content;
        }
        if later.status.is_some() {
            self.status = later.status;
        }
        if later.start_date.is_some() {
            self.start_date = later.start_date;
        }
        if later.end_date.is_some() {
            self.end_date = later.end_date;
        }
    }

    /// Whether the update would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }
}

/// Form data for creating a task.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskFormData {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

impl TryFrom<TaskFormData> for NewTask {
    type Error = Error;

    fn try_from(form: TaskFormData) -> Result<Self, Self::Error> {
        let status = if form.status.is_empty() {
            TaskStatus::default()
        } else {
            form.status.parse()?
        };

        Ok(NewTask {
            title: TaskTitle::new(&form.title)?,
            content: non_empty(&form.content),
            status,
            start_date: parse_form_date(&form.start_date)?,
            end_date: parse_optional_form_date(&form.end_date)?,
        })
    }
}

/// Form data for an inline edit, only the edited inputs are sent.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskUpdateFormData {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TryFrom<TaskUpdateFormData> for TaskUpdate {
    type Error = Error;

    fn try_from(form: TaskUpdateFormData) -> Result<Self, Self::Error> {
        Ok(TaskUpdate {
            title: form.title.as_deref().map(TaskTitle::new).transpose()?,
            content: form.content.as_deref().map(non_empty),
            status: form
                .status
                .as_deref()
                .map(str::parse::<TaskStatus>)
                .transpose()?,
            start_date: form.start_date.as_deref().map(parse_form_date).transpose()?,
            end_date: form
                .end_date
                .as_deref()
                .map(parse_optional_form_date)
                .transpose()?,
        })
    }
}

/// Parse a date in the format sent by HTML date inputs.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid "YYYY-MM-DD" date.
pub fn parse_form_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), FORM_DATE_FORMAT).map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn parse_optional_form_date(text: &str) -> Result<Option<Date>, Error> {
    if text.trim().is_empty() {
        Ok(None)
    } else {
        parse_form_date(text).map(Some)
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();

    (!text.is_empty()).then(|| text.to_owned())
}


#[cfg(test)]
mod task_status_tests {
    use crate::{Error, task::TaskStatus};

    #[test]
    fn parses_every_status() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert_eq!(
            "finished".parse::<TaskStatus>(),
            Err(Error::InvalidTaskStatus("finished".to_owned()))
        );
    }

    #[test]
    fn labels() {
        assert_eq!(TaskStatus::Todo.label(), "To Do");
        assert_eq!(TaskStatus::InProgress.label(), "In Progress");
        assert_eq!(TaskStatus::Done.label(), "Done");
        assert_eq!(TaskStatus::Blocked.label(), "Blocked");
    }
}
