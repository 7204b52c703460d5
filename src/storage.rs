//! Local persistence for projects, their paths, and waypoints.
//!
//! Each project lives in its own `SQLite` file under the storage root:
//!
//! ```text
//! <root>/<uuid>.sqlite
//!   project    # one row: project metadata
//!   member     # enrolled employees, in enrolment order
//!   path       # one row per path, keyed by its index in the project
//!   waypoint   # JSON body, keyed by (path index, position in path)
//! ```

mod project;
mod waypoint;

use std::{fs, path::PathBuf};

use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use crate::assemble::PathConflict;
use crate::model::EmployeeId;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("project already exists: {0}")]
    ProjectAlreadyExists(Uuid),

    #[error("employee {0} is already a member")]
    MemberAlreadyExists(EmployeeId),

    /// The stored paths no longer admit the append, e.g. after a concurrent submission.
    #[error("path conflict: {0}")]
    Conflict(#[from] PathConflict),

    #[error("corrupt project data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
    CREATE TABLE project (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        circle      TEXT NOT NULL,
        division    TEXT NOT NULL,
        description TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );
    CREATE TABLE member (
        seq  INTEGER PRIMARY KEY AUTOINCREMENT,
        id   TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    );
    CREATE TABLE path (
        seq   INTEGER PRIMARY KEY,
        owner TEXT NOT NULL
    );
    CREATE TABLE waypoint (
        path_seq INTEGER NOT NULL REFERENCES path (seq),
        position INTEGER NOT NULL,
        body     TEXT NOT NULL,
        PRIMARY KEY (path_seq, position)
    );
";

/// Local file-based storage for survey projects.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.surveyor/projects/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".surveyor").join("projects"))
    }

    fn db_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.sqlite"))
    }

    /// Creates the database file for a new project and its schema.
    fn create_db(&self, id: Uuid) -> Result<Connection> {
        let path = self.db_path(id);
        if path.exists() {
            return Err(StorageError::ProjectAlreadyExists(id));
        }
        let conn = Connection::open(path)?;
        if let Err(e) = conn.execute_batch(SCHEMA) {
            drop(conn);
            self.discard_db(id);
            return Err(e.into());
        }
        Ok(conn)
    }

    /// Removes the database file of a project whose creation failed.
    fn discard_db(&self, id: Uuid) {
        let path = self.db_path(id);
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "failed to remove partial project file");
        }
    }

    /// Opens the database file of an existing project.
    fn open_db(&self, id: Uuid) -> Result<Connection> {
        let path = self.db_path(id);
        if !path.exists() {
            return Err(StorageError::ProjectNotFound(id));
        }
        Ok(Connection::open(path)?)
    }
}
