//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, task::AutosaveQueue, user::UserId};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The user whose records are shown and edited.
    pub user_id: UserId,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// Writes inline task edits once the user stops typing.
    pub autosave: AutosaveQueue,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models
    /// and start the autosave queue, so it must be called from within a tokio runtime.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        user_id: UserId,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));
        let autosave = AutosaveQueue::spawn(user_id, connection.clone());

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            user_id,
            db_connection: connection,
            autosave,
        })
    }
}
