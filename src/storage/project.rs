//! Project storage: create, load, list projects and enrol members.

use std::{fs, io};

use rusqlite::{Connection, OptionalExtension};
use tracing::warn;
use uuid::Uuid;

use crate::model::{EmployeeId, Member, Path, Project};

use super::{Result, Storage, StorageError};

impl Storage {
    /// Creates a new project, writing its metadata and members to a new `SQLite` file.
    ///
    /// Paths on the given project are ignored; they are only ever added
    /// one waypoint at a time through [`Storage::append_waypoint`].
    pub fn create_project(&self, project: &Project) -> Result<()> {
        let mut conn = self.create_db(project.id)?;
        if let Err(e) = insert_project(&mut conn, project) {
            drop(conn);
            self.discard_db(project.id);
            return Err(e);
        }
        Ok(())
    }

    /// Loads a project with all of its members, paths, and waypoints.
    pub fn load_project(&self, id: Uuid) -> Result<Project> {
        let conn = self.open_db(id)?;
        load_project_rows(&conn)
    }

    /// Lists all projects by reading each `.sqlite` file in the storage root.
    ///
    /// Unreadable or malformed files are skipped with a warning.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(projects),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sqlite") {
                continue;
            }
            let loaded = Connection::open(&path)
                .map_err(StorageError::from)
                .and_then(|conn| load_project_rows(&conn));
            match loaded {
                Ok(p) => projects.push(p),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable project"),
            }
        }
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    /// Enrols an employee on a project.
    pub fn add_member(&self, project_id: Uuid, member: &Member) -> Result<()> {
        let conn = self.open_db(project_id)?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM member WHERE id = ?1",
                [member.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StorageError::MemberAlreadyExists(member.id.clone()));
        }
        conn.execute(
            "INSERT INTO member (id, name) VALUES (?1, ?2)",
            rusqlite::params![member.id.as_str(), &member.name],
        )?;
        Ok(())
    }
}

/// Writes the project row and its members in one transaction.
fn insert_project(conn: &mut Connection, project: &Project) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO project (id, name, circle, division, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            project.id.to_string(),
            &project.name,
            &project.circle,
            &project.division,
            &project.description,
            project.created_at.to_string(),
        ],
    )?;
    for member in &project.members {
        tx.execute(
            "INSERT INTO member (id, name) VALUES (?1, ?2)",
            rusqlite::params![member.id.as_str(), &member.name],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Reads the full project aggregate from an open connection.
fn load_project_rows(conn: &Connection) -> Result<Project> {
    let (id_str, name, circle, division, description, created_at_str) = conn.query_row(
        "SELECT id, name, circle, division, description, created_at FROM project LIMIT 1",
        [],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        },
    )?;

    let id = id_str
        .parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid project id: {e}")))?;
    let created_at = created_at_str
        .parse::<jiff::Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid created_at: {e}")))?;

    Ok(Project {
        id,
        name,
        circle,
        division,
        description,
        members: load_members(conn)?,
        created_at,
        paths: load_paths(conn)?,
    })
}

fn load_members(conn: &Connection) -> Result<Vec<Member>> {
    let mut stmt = conn.prepare("SELECT id, name FROM member ORDER BY seq")?;
    let rows = stmt.query_map([], |row| {
        Ok(Member {
            id: EmployeeId::new(row.get::<_, String>(0)?),
            name: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Loads paths in start order, each with its waypoints in submission order.
fn load_paths(conn: &Connection) -> Result<Vec<Path>> {
    let mut path_stmt = conn.prepare("SELECT seq, owner FROM path ORDER BY seq")?;
    let heads = path_stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut waypoint_stmt =
        conn.prepare("SELECT body FROM waypoint WHERE path_seq = ?1 ORDER BY position")?;
    let mut paths = Vec::with_capacity(heads.len());
    for (seq, owner) in heads {
        let bodies = waypoint_stmt
            .query_map([seq], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let waypoints = bodies
            .iter()
            .map(|body| serde_json::from_str(body))
            .collect::<serde_json::Result<Vec<_>>>()?;
        paths.push(Path {
            owner: EmployeeId::new(owner),
            waypoints,
        });
    }
    Ok(paths)
}
