//! Path assembly: deciding where each submitted waypoint goes.
//!
//! An employee has at most one open path per project. The open path is never
//! tracked explicitly; it is re-derived on every submission from the last path
//! that employee owns, so the decision depends on persisted data alone.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::{EmployeeId, Path, Project, Waypoint, WaypointKind};
use crate::storage::{Storage, StorageError};

/// A submission that would leave the employee's paths malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathConflict {
    /// A start arrived while the employee still has an open path.
    #[error("last path not complete")]
    LastPathNotComplete,

    /// An end arrived with no open path to close.
    #[error("no path to end")]
    NoPathToEnd,

    /// A midpoint arrived with no open path to extend.
    #[error("no active path")]
    NoActivePath,
}

/// Where an accepted waypoint was placed, as an index into `Project::paths`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// A new path was opened.
    Started { path_index: usize },

    /// The open path was extended with a midpoint.
    Extended { path_index: usize },

    /// The open path was closed.
    Closed { path_index: usize },
}

impl Placement {
    pub fn path_index(self) -> usize {
        match self {
            Self::Started { path_index }
            | Self::Extended { path_index }
            | Self::Closed { path_index } => path_index,
        }
    }
}

/// Errors from submitting a waypoint through storage.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Conflict(#[from] PathConflict),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Index of the employee's most recently started path, if it is still open.
fn open_path_index(project: &Project, employee: &EmployeeId) -> Option<usize> {
    project
        .paths
        .iter()
        .rposition(|p| &p.owner == employee)
        .filter(|&i| project.paths[i].is_open())
}

/// Places `candidate` into the project on behalf of `employee`.
///
/// Either appends exactly one waypoint or leaves the project untouched.
pub fn place_waypoint(
    project: &mut Project,
    employee: &EmployeeId,
    candidate: Waypoint,
) -> Result<Placement, PathConflict> {
    let open = open_path_index(project, employee);
    debug!(
        project = %project.id,
        %employee,
        kind = ?candidate.kind,
        open_path = ?open,
        "placing waypoint"
    );

    let placement = match (candidate.kind, open) {
        (WaypointKind::Start, Some(_)) => return Err(PathConflict::LastPathNotComplete),
        (WaypointKind::Start, None) => {
            project.paths.push(Path::open(employee.clone(), candidate));
            Placement::Started {
                path_index: project.paths.len() - 1,
            }
        }
        (WaypointKind::End, None) => return Err(PathConflict::NoPathToEnd),
        (WaypointKind::End, Some(path_index)) => {
            project.paths[path_index].waypoints.push(candidate);
            Placement::Closed { path_index }
        }
        (WaypointKind::Mid, None) => return Err(PathConflict::NoActivePath),
        (WaypointKind::Mid, Some(path_index)) => {
            project.paths[path_index].waypoints.push(candidate);
            Placement::Extended { path_index }
        }
    };
    Ok(placement)
}

/// Loads the project, places the waypoint, and persists the single append.
///
/// The candidate is attributed to `employee` before placement. The append
/// re-checks the placement against the stored paths, so a submission that
/// raced another one is either stored where it now belongs or rejected with
/// the conflict it would have hit. Returns the placement as stored.
pub fn submit_waypoint(
    storage: &Storage,
    project_id: Uuid,
    employee: &EmployeeId,
    mut candidate: Waypoint,
) -> Result<Placement, SubmitError> {
    candidate.created_by = employee.clone();
    candidate.path_owner = employee.clone();

    let mut project = storage.load_project(project_id)?;
    let placement = match place_waypoint(&mut project, employee, candidate) {
        Ok(p) => p,
        Err(conflict) => {
            warn!(project = %project_id, %employee, %conflict, "rejected waypoint");
            return Err(conflict.into());
        }
    };

    let waypoint = project
        .paths
        .get(placement.path_index())
        .and_then(Path::last)
        .ok_or_else(|| StorageError::Corrupt("placed waypoint missing from its path".into()))?;
    let stored = match storage.append_waypoint(project_id, placement, waypoint) {
        Ok(stored) => stored,
        Err(StorageError::Conflict(conflict)) => {
            warn!(project = %project_id, %employee, %conflict, "rejected waypoint on append");
            return Err(conflict.into());
        }
        Err(e) => return Err(e.into()),
    };
    if stored != placement {
        debug!(?placement, ?stored, "stored paths moved since load");
    }
    info!(
        project = %project_id,
        %employee,
        waypoint = %waypoint.id,
        placement = ?stored,
        "recorded waypoint"
    );
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use crate::model::{GeoPosition, Member};

    fn point(kind: WaypointKind, employee: &str, secs: i64) -> Waypoint {
        Waypoint::new(
            kind,
            GeoPosition::new(22.5, 88.3),
            Timestamp::new(secs, 0).unwrap(),
            EmployeeId::from(employee),
        )
    }

    fn project() -> Project {
        Project::new("Feeder 7", Timestamp::new(1_000, 0).unwrap())
    }

    #[test]
    fn start_opens_new_path() {
        let mut project = project();
        let emp = EmployeeId::from("a");

        let placement =
            place_waypoint(&mut project, &emp, point(WaypointKind::Start, "a", 1)).unwrap();

        assert_eq!(placement, Placement::Started { path_index: 0 });
        assert_eq!(project.paths.len(), 1);
        assert!(project.paths[0].is_open());
    }

    #[test]
    fn second_start_while_open_conflicts() {
        let mut project = project();
        let emp = EmployeeId::from("a");
        place_waypoint(&mut project, &emp, point(WaypointKind::Start, "a", 1)).unwrap();

        let err =
            place_waypoint(&mut project, &emp, point(WaypointKind::Start, "a", 2)).unwrap_err();

        assert_eq!(err, PathConflict::LastPathNotComplete);
        assert_eq!(err.to_string(), "last path not complete");
        assert_eq!(project.paths.len(), 1);
        assert_eq!(project.paths[0].waypoints.len(), 1);
    }

    #[test]
    fn start_mid_end_closes_path() {
        let mut project = project();
        let emp = EmployeeId::from("a");

        place_waypoint(&mut project, &emp, point(WaypointKind::Start, "a", 1)).unwrap();
        let mid = place_waypoint(&mut project, &emp, point(WaypointKind::Mid, "a", 2)).unwrap();
        let end = place_waypoint(&mut project, &emp, point(WaypointKind::End, "a", 3)).unwrap();

        assert_eq!(mid, Placement::Extended { path_index: 0 });
        assert_eq!(end, Placement::Closed { path_index: 0 });
        assert_eq!(project.paths[0].waypoints.len(), 3);
        assert!(project.paths[0].is_closed());
    }

    #[test]
    fn midpoint_without_start_conflicts() {
        let mut project = project();
        let emp = EmployeeId::from("a");

        let err = place_waypoint(&mut project, &emp, point(WaypointKind::Mid, "a", 1)).unwrap_err();

        assert_eq!(err, PathConflict::NoActivePath);
        assert_eq!(err.to_string(), "no active path");
        assert!(project.paths.is_empty());
    }

    #[test]
    fn end_without_open_path_conflicts() {
        let mut project = project();
        let emp = EmployeeId::from("a");

        let err = place_waypoint(&mut project, &emp, point(WaypointKind::End, "a", 1)).unwrap_err();
        assert_eq!(err, PathConflict::NoPathToEnd);

        place_waypoint(&mut project, &emp, point(WaypointKind::Start, "a", 2)).unwrap();
        place_waypoint(&mut project, &emp, point(WaypointKind::End, "a", 3)).unwrap();

        // Closed paths cannot be closed again or extended.
        let err = place_waypoint(&mut project, &emp, point(WaypointKind::End, "a", 4)).unwrap_err();
        assert_eq!(err, PathConflict::NoPathToEnd);
        let err = place_waypoint(&mut project, &emp, point(WaypointKind::Mid, "a", 5)).unwrap_err();
        assert_eq!(err, PathConflict::NoActivePath);
    }

    #[test]
    fn start_after_closed_path_opens_another() {
        let mut project = project();
        let emp = EmployeeId::from("a");
        place_waypoint(&mut project, &emp, point(WaypointKind::Start, "a", 1)).unwrap();
        place_waypoint(&mut project, &emp, point(WaypointKind::End, "a", 2)).unwrap();

        let placement =
            place_waypoint(&mut project, &emp, point(WaypointKind::Start, "a", 3)).unwrap();

        assert_eq!(placement, Placement::Started { path_index: 1 });
    }

    #[test]
    fn interleaved_employees_keep_separate_paths() {
        let mut project = project();
        let a = EmployeeId::from("a");
        let b = EmployeeId::from("b");

        place_waypoint(&mut project, &a, point(WaypointKind::Start, "a", 1)).unwrap();
        place_waypoint(&mut project, &b, point(WaypointKind::Start, "b", 2)).unwrap();
        let a_mid = place_waypoint(&mut project, &a, point(WaypointKind::Mid, "a", 3)).unwrap();
        let b_end = place_waypoint(&mut project, &b, point(WaypointKind::End, "b", 4)).unwrap();
        let a_end = place_waypoint(&mut project, &a, point(WaypointKind::End, "a", 5)).unwrap();

        assert_eq!(a_mid, Placement::Extended { path_index: 0 });
        assert_eq!(b_end, Placement::Closed { path_index: 1 });
        assert_eq!(a_end, Placement::Closed { path_index: 0 });
        assert!(project.paths[0].waypoints.iter().all(|w| w.created_by == a));
        assert!(project.paths[1].waypoints.iter().all(|w| w.created_by == b));
    }

    #[test]
    fn any_accepted_sequence_leaves_at_most_one_open_path() {
        let kinds = [
            WaypointKind::Mid,
            WaypointKind::Start,
            WaypointKind::Start,
            WaypointKind::Mid,
            WaypointKind::End,
            WaypointKind::End,
            WaypointKind::Start,
            WaypointKind::Mid,
            WaypointKind::Start,
            WaypointKind::End,
            WaypointKind::Mid,
        ];
        let mut project = project();
        let emp = EmployeeId::from("a");

        for (secs, kind) in (1..).zip(kinds) {
            let _ = place_waypoint(&mut project, &emp, point(kind, "a", secs));
            let open = project.paths.iter().filter(|p| p.is_open()).count();
            assert!(open <= 1);
        }
        assert!(project.paths.iter().all(|p| p.waypoints[0].is_start()));
    }

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("projects")).unwrap();
        (dir, storage)
    }

    #[test]
    fn submit_persists_placements() {
        let (_dir, storage) = test_storage();
        let mut project = project();
        project.members.push(Member {
            id: EmployeeId::from("a"),
            name: "Asha".into(),
        });
        storage.create_project(&project).unwrap();
        let emp = EmployeeId::from("a");

        let kinds = [WaypointKind::Start, WaypointKind::Mid, WaypointKind::End];
        for (secs, kind) in (1..).zip(kinds) {
            submit_waypoint(&storage, project.id, &emp, point(kind, "a", secs)).unwrap();
        }

        let loaded = storage.load_project(project.id).unwrap();
        assert_eq!(loaded.paths.len(), 1);
        assert_eq!(loaded.paths[0].waypoints.len(), 3);
        assert!(loaded.paths[0].is_closed());
    }

    #[test]
    fn submit_attributes_waypoint_to_employee() {
        let (_dir, storage) = test_storage();
        let project = project();
        storage.create_project(&project).unwrap();
        let emp = EmployeeId::from("a");

        let candidate = point(WaypointKind::Start, "someone-else", 1);
        submit_waypoint(&storage, project.id, &emp, candidate).unwrap();

        let loaded = storage.load_project(project.id).unwrap();
        let waypoint = &loaded.paths[0].waypoints[0];
        assert_eq!(waypoint.created_by, emp);
        assert_eq!(waypoint.path_owner, emp);
        assert_eq!(loaded.paths[0].owner, emp);
    }

    #[test]
    fn rejected_submit_persists_nothing() {
        let (_dir, storage) = test_storage();
        let project = project();
        storage.create_project(&project).unwrap();
        let emp = EmployeeId::from("a");

        let first = point(WaypointKind::Start, "a", 1);
        submit_waypoint(&storage, project.id, &emp, first).unwrap();
        let second = point(WaypointKind::Start, "a", 2);
        let err = submit_waypoint(&storage, project.id, &emp, second).unwrap_err();

        assert!(matches!(
            err,
            SubmitError::Conflict(PathConflict::LastPathNotComplete)
        ));
        let loaded = storage.load_project(project.id).unwrap();
        assert_eq!(loaded.paths.len(), 1);
        assert_eq!(loaded.paths[0].waypoints.len(), 1);
    }

    #[test]
    fn submit_to_missing_project_fails() {
        let (_dir, storage) = test_storage();
        let emp = EmployeeId::from("a");

        let candidate = point(WaypointKind::Start, "a", 1);
        let err = submit_waypoint(&storage, Uuid::new_v4(), &emp, candidate).unwrap_err();

        assert!(matches!(
            err,
            SubmitError::Storage(StorageError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn submit_reports_the_stored_path_index() {
        let (_dir, storage) = test_storage();
        let project = project();
        storage.create_project(&project).unwrap();
        let a = EmployeeId::from("a");
        let b = EmployeeId::from("b");

        let a_start = submit_waypoint(&storage, project.id, &a, point(WaypointKind::Start, "a", 1));
        let b_start = submit_waypoint(&storage, project.id, &b, point(WaypointKind::Start, "b", 2));
        let a_end = submit_waypoint(&storage, project.id, &a, point(WaypointKind::End, "a", 3));

        assert_eq!(a_start.unwrap(), Placement::Started { path_index: 0 });
        assert_eq!(b_start.unwrap(), Placement::Started { path_index: 1 });
        assert_eq!(a_end.unwrap(), Placement::Closed { path_index: 0 });
    }
}
