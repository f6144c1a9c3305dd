//! Task list with drag-and-drop ordering and inline editing.

mod autosave;
mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod filter;
mod list;
mod ordering;
mod reorder;

pub use autosave::AutosaveQueue;
pub use create::create_task_endpoint;
pub use db::{create_task, create_task_table, get_task, get_tasks, update_task};
pub use delete::delete_task_endpoint;
pub use domain::{NewTask, Task, TaskId, TaskStatus, TaskTitle, TaskUpdate};
pub use edit::update_task_endpoint;
pub use list::get_tasks_page;
pub use reorder::reorder_tasks_endpoint;
