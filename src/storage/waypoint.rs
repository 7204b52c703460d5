//! Waypoint storage: append placed waypoints to a project's paths.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::assemble::{PathConflict, Placement};
use crate::model::Waypoint;

use super::{Result, Storage, StorageError};

impl Storage {
    /// Appends a placed waypoint to a project, in a single immediate transaction.
    ///
    /// The placement is re-checked against the stored paths of the waypoint's
    /// owner, since they may have changed since the caller loaded the project.
    /// A `Started` placement inserts a new path after the last stored one,
    /// whatever index the caller saw. Returns the placement as stored.
    pub fn append_waypoint(
        &self,
        project_id: Uuid,
        placement: Placement,
        waypoint: &Waypoint,
    ) -> Result<Placement> {
        let mut conn = self.open_db(project_id)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = waypoint.path_owner.as_str();
        let open = open_path_seq(&tx, owner)?;

        let (seq, position, stored) = match placement {
            Placement::Started { .. } => {
                if open.is_some() {
                    return Err(PathConflict::LastPathNotComplete.into());
                }
                let seq: i64 =
                    tx.query_row("SELECT COALESCE(MAX(seq) + 1, 0) FROM path", [], |row| {
                        row.get(0)
                    })?;
                tx.execute(
                    "INSERT INTO path (seq, owner) VALUES (?1, ?2)",
                    rusqlite::params![seq, owner],
                )?;
                let path_index = usize::try_from(seq)
                    .map_err(|e| StorageError::Corrupt(format!("invalid path seq {seq}: {e}")))?;
                (seq, 0, Placement::Started { path_index })
            }
            Placement::Extended { path_index } | Placement::Closed { path_index } => {
                let seq = i64::try_from(path_index)
                    .map_err(|e| StorageError::Corrupt(format!("path index out of range: {e}")))?;
                if open != Some(seq) {
                    let conflict = match placement {
                        Placement::Closed { .. } => PathConflict::NoPathToEnd,
                        _ => PathConflict::NoActivePath,
                    };
                    return Err(conflict.into());
                }
                let count: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM waypoint WHERE path_seq = ?1",
                    [seq],
                    |row| row.get(0),
                )?;
                (seq, count, placement)
            }
        };

        let body = serde_json::to_string(waypoint)?;
        tx.execute(
            "INSERT INTO waypoint (path_seq, position, body) VALUES (?1, ?2, ?3)",
            rusqlite::params![seq, position, body],
        )?;
        tx.commit()?;
        Ok(stored)
    }
}

/// The `seq` of the owner's most recently started path, if it is still open.
fn open_path_seq(conn: &Connection, owner: &str) -> Result<Option<i64>> {
    let last: Option<(i64, Option<String>)> = conn
        .query_row(
            "SELECT p.seq,
                    (SELECT body FROM waypoint
                     WHERE path_seq = p.seq ORDER BY position DESC LIMIT 1)
             FROM path p WHERE p.owner = ?1 ORDER BY p.seq DESC LIMIT 1",
            [owner],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((seq, last_body)) = last else {
        return Ok(None);
    };
    let closed = match last_body {
        Some(body) => serde_json::from_str::<Waypoint>(&body)?.is_end(),
        None => false,
    };
    Ok((!closed).then_some(seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use crate::assemble::place_waypoint;
    use crate::model::{EmployeeId, GeoPosition, Project, WaypointKind};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("projects")).unwrap();
        (dir, storage)
    }

    fn waypoint(kind: WaypointKind, employee: &str, secs: i64) -> Waypoint {
        Waypoint::new(
            kind,
            GeoPosition::new(22.5, 88.3),
            Timestamp::new(secs, 0).unwrap(),
            EmployeeId::from(employee),
        )
    }

    fn stored_project(storage: &Storage) -> Project {
        let project = Project::new("Feeder 7", Timestamp::now());
        storage.create_project(&project).unwrap();
        project
    }

    #[test]
    fn appends_keep_path_and_position_order() {
        let (_dir, storage) = test_storage();
        let project = stored_project(&storage);

        let a_start = waypoint(WaypointKind::Start, "a", 1);
        let b_start = waypoint(WaypointKind::Start, "b", 2);
        let a_end = waypoint(WaypointKind::End, "a", 3);

        storage
            .append_waypoint(project.id, Placement::Started { path_index: 0 }, &a_start)
            .unwrap();
        storage
            .append_waypoint(project.id, Placement::Started { path_index: 1 }, &b_start)
            .unwrap();
        let closed = storage
            .append_waypoint(project.id, Placement::Closed { path_index: 0 }, &a_end)
            .unwrap();

        assert_eq!(closed, Placement::Closed { path_index: 0 });
        let loaded = storage.load_project(project.id).unwrap();
        assert_eq!(loaded.paths.len(), 2);
        assert_eq!(loaded.paths[0].owner, EmployeeId::from("a"));
        assert_eq!(loaded.paths[0].waypoints, vec![a_start, a_end]);
        assert_eq!(loaded.paths[1].owner, EmployeeId::from("b"));
        assert_eq!(loaded.paths[1].waypoints, vec![b_start]);
    }

    #[test]
    fn concurrent_starts_from_different_owners_both_land() {
        let (_dir, storage) = test_storage();
        let project = stored_project(&storage);

        // Both submissions decide against the same, still empty, project.
        let mut seen_by_a = storage.load_project(project.id).unwrap();
        let mut seen_by_b = storage.load_project(project.id).unwrap();
        let a = EmployeeId::from("a");
        let b = EmployeeId::from("b");
        let a_placed =
            place_waypoint(&mut seen_by_a, &a, waypoint(WaypointKind::Start, "a", 1)).unwrap();
        let b_placed =
            place_waypoint(&mut seen_by_b, &b, waypoint(WaypointKind::Start, "b", 2)).unwrap();
        assert_eq!(a_placed, b_placed);

        let a_stored = storage
            .append_waypoint(project.id, a_placed, &seen_by_a.paths[0].waypoints[0])
            .unwrap();
        let b_stored = storage
            .append_waypoint(project.id, b_placed, &seen_by_b.paths[0].waypoints[0])
            .unwrap();

        assert_eq!(a_stored, Placement::Started { path_index: 0 });
        assert_eq!(b_stored, Placement::Started { path_index: 1 });
        let loaded = storage.load_project(project.id).unwrap();
        assert_eq!(loaded.paths.len(), 2);
        assert_eq!(loaded.paths[0].owner, a);
        assert_eq!(loaded.paths[1].owner, b);
    }

    #[test]
    fn extending_missing_path_fails_without_writing() {
        let (_dir, storage) = test_storage();
        let project = stored_project(&storage);

        let err = storage
            .append_waypoint(
                project.id,
                Placement::Extended { path_index: 3 },
                &waypoint(WaypointKind::Mid, "a", 1),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            StorageError::Conflict(PathConflict::NoActivePath)
        ));
        assert!(storage.load_project(project.id).unwrap().paths.is_empty());
    }

    #[test]
    fn second_start_for_same_owner_conflicts() {
        let (_dir, storage) = test_storage();
        let project = stored_project(&storage);
        let start = waypoint(WaypointKind::Start, "a", 1);

        storage
            .append_waypoint(project.id, Placement::Started { path_index: 0 }, &start)
            .unwrap();
        let err = storage
            .append_waypoint(project.id, Placement::Started { path_index: 0 }, &start)
            .unwrap_err();

        assert!(matches!(
            err,
            StorageError::Conflict(PathConflict::LastPathNotComplete)
        ));
        let loaded = storage.load_project(project.id).unwrap();
        assert_eq!(loaded.paths.len(), 1);
        assert_eq!(loaded.paths[0].waypoints.len(), 1);
    }

    #[test]
    fn closing_a_closed_path_conflicts() {
        let (_dir, storage) = test_storage();
        let project = stored_project(&storage);
        let end = waypoint(WaypointKind::End, "a", 2);

        storage
            .append_waypoint(
                project.id,
                Placement::Started { path_index: 0 },
                &waypoint(WaypointKind::Start, "a", 1),
            )
            .unwrap();
        storage
            .append_waypoint(project.id, Placement::Closed { path_index: 0 }, &end)
            .unwrap();
        let err = storage
            .append_waypoint(project.id, Placement::Closed { path_index: 0 }, &end)
            .unwrap_err();

        assert!(matches!(
            err,
            StorageError::Conflict(PathConflict::NoPathToEnd)
        ));
        let loaded = storage.load_project(project.id).unwrap();
        assert_eq!(loaded.paths[0].waypoints.len(), 2);
    }

    #[test]
    fn append_to_nonexistent_project_fails() {
        let (_dir, storage) = test_storage();
        let err = storage
            .append_waypoint(
                Uuid::new_v4(),
                Placement::Started { path_index: 0 },
                &waypoint(WaypointKind::Start, "a", 1),
            )
            .unwrap_err();

        assert!(matches!(err, StorageError::ProjectNotFound(_)));
    }
}
