//! Path: one employee's ordered run of waypoints within a project.

use serde::{Deserialize, Serialize};

use super::{EmployeeId, Waypoint};

/// An ordered sequence of waypoints walked by one employee.
///
/// Begins with a start waypoint. Open until its last waypoint is an end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub owner: EmployeeId,
    pub waypoints: Vec<Waypoint>,
}

impl Path {
    /// Opens a new path for `owner` with `start` as its only waypoint.
    pub fn open(owner: EmployeeId, start: Waypoint) -> Self {
        Self {
            owner,
            waypoints: vec![start],
        }
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// True when the path has not yet been terminated by an end waypoint.
    pub fn is_open(&self) -> bool {
        !self.is_closed()
    }

    pub fn is_closed(&self) -> bool {
        self.last().is_some_and(Waypoint::is_end)
    }
}
