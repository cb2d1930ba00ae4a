use crate::task::Task;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const SCHEMA_TAREAS: &str = "CREATE TABLE IF NOT EXISTS tareas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    titulo TEXT NOT NULL,
    descripcion TEXT,
    completada BOOLEAN NOT NULL DEFAULT 0
)";
const INSERT_TAREA: &str = "INSERT INTO tareas (titulo, descripcion) VALUES (?1, ?2)";
const SELECT_TAREAS: &str = "SELECT id, titulo, descripcion, completada FROM tareas";
const DELETE_TAREA: &str = "DELETE FROM tareas WHERE id = ?1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open task database at {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// File-backed task table.
///
/// Only the path is held. Every operation opens its own connection, runs a
/// single statement and drops the connection before returning, so no lock
/// outlives a call.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Connection::open(&self.path).map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })
    }

    /// Creates the `tareas` table if it does not exist yet. Safe to call on
    /// every start.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(SCHEMA_TAREAS, [])?;
        debug!(path = %self.path.display(), "task table ready");
        Ok(())
    }

    /// Appends a task with `completed = false` and returns its id.
    ///
    /// The title is stored as given; rejecting blank titles is up to the caller.
    pub fn create(&self, title: &str, description: &str) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        conn.execute(INSERT_TAREA, params![title, description])?;
        let id = conn.last_insert_rowid();
        debug!(id, "task inserted");
        Ok(id)
    }

    /// Returns a snapshot of every stored task in storage order.
    pub fn list(&self) -> Result<Vec<Task>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(SELECT_TAREAS)?;
        let tasks = stmt
            .query_map([], |row| {
                let description: Option<String> = row.get(2)?;
                Ok(Task {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: description.unwrap_or_default(),
                    completed: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    /// Removes the task with `id`. Returns the number of removed rows; an
    /// unknown id removes nothing and is not an error.
    pub fn delete(&self, id: i64) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let removed = conn.execute(DELETE_TAREA, params![id])?;
        debug!(id, removed, "task delete");
        Ok(removed)
    }
}
