//! Debounced writer for inline task edits.
//!
//! Each keystroke in the task list sends an edit, writing every one of them
//! would hammer the database. Edits are held per task until no new edit for
//! that task has arrived for [AUTOSAVE_DELAY], then merged and written once.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::Connection;
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};

use crate::{
    Error,
    task::{TaskId, TaskUpdate, update_task},
    user::UserId,
};

/// How long a task must go without edits before its pending edit is written.
pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(400);

enum Command {
    Schedule { task_id: TaskId, update: TaskUpdate },
    Flush(oneshot::Sender<()>),
}

struct PendingEdit {
    update: TaskUpdate,
    due: Instant,
}

/// A handle to the background task that writes inline edits.
///
/// Cloning the handle is cheap, all clones feed the same queue.
#[derive(Debug, Clone)]
pub struct AutosaveQueue {
    sender: mpsc::UnboundedSender<Command>,
}

impl AutosaveQueue {
    /// Start the writer with the default [AUTOSAVE_DELAY].
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(user_id: UserId, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self::spawn_with_delay(user_id, db_connection, AUTOSAVE_DELAY)
    }

    /// Start the writer with a custom quiet period.
    pub fn spawn_with_delay(
        user_id: UserId,
        db_connection: Arc<Mutex<Connection>>,
        delay: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(receiver, user_id, db_connection, delay));

        Self { sender }
    }

    /// Queue an edit of `task_id`, merging it into any edit that is still pending.
    ///
    /// # Errors
    /// Returns [Error::AutosaveUnavailable] if the writer has stopped.
    pub fn schedule(&self, task_id: TaskId, update: TaskUpdate) -> Result<(), Error> {
        self.sender
            .send(Command::Schedule { task_id, update })
            .map_err(|_| Error::AutosaveUnavailable)
    }

    /// Write every pending edit now and wait for the writes to finish.
    ///
    /// # Errors
    /// Returns [Error::AutosaveUnavailable] if the writer has stopped.
    pub async fn flush(&self) -> Result<(), Error> {
        let (done_sender, done_receiver) = oneshot::channel();

        self.sender
            .send(Command::Flush(done_sender))
            .map_err(|_| Error::AutosaveUnavailable)?;

        done_receiver.await.map_err(|_| Error::AutosaveUnavailable)
    }
}

async fn run_writer(
    mut receiver: mpsc::UnboundedReceiver<Command>,
    user_id: UserId,
    db_connection: Arc<Mutex<Connection>>,
    delay: Duration,
) {
    let mut pending: HashMap<TaskId, PendingEdit> = HashMap::new();

    loop {
        let next_due = pending.values().map(|edit| edit.due).min();

        let command = match next_due {
            Some(due) => {
                tokio::select! {
                    command = receiver.recv() => command,
                    _ = tokio::time::sleep_until(due) => {
                        let now = Instant::now();
                        let due_ids: Vec<TaskId> = pending
                            .iter()
                            .filter(|(_, edit)| edit.due <= now)
                            .map(|(task_id, _)| *task_id)
                            .collect();
                        let due_edits = due_ids
                            .into_iter()
                            .filter_map(|task_id| pending.remove(&task_id).map(|edit| (task_id, edit)))
                            .collect();

                        write_edits(user_id, due_edits, &db_connection);
                        continue;
                    }
                }
            }
            None => receiver.recv().await,
        };

        match command {
            Some(Command::Schedule { task_id, update }) => {
                let due = Instant::now() + delay;

                match pending.get_mut(&task_id) {
                    Some(edit) => {
                        edit.update.merge(update);
                        edit.due = due;
                    }
                    None => {
                        pending.insert(task_id, PendingEdit { update, due });
                    }
                }
            }
            Some(Command::Flush(done)) => {
                write_edits(user_id, pending.drain().collect(), &db_connection);
                // The caller may have given up waiting, that is fine.
                let _ = done.send(());
            }
            None => {
                write_edits(user_id, pending.drain().collect(), &db_connection);
                tracing::debug!("Autosave queue closed.");
                break;
            }
        }
    }
}

fn write_edits(
    user_id: UserId,
    edits: Vec<(TaskId, PendingEdit)>,
    db_connection: &Arc<Mutex<Connection>>,
) {
    if edits.is_empty() {
        return;
    }

    let connection = match db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return;
        }
    };

    for (task_id, edit) in edits {
        if edit.update.is_empty() {
            continue;
        }

        match update_task(user_id, task_id, edit.update, &connection) {
            Ok(()) => tracing::debug!("Saved edit of task {task_id}"),
            Err(error) => tracing::error!("Could not save edit of task {task_id}: {error}"),
        }
    }
}
