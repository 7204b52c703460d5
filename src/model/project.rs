//! Project types: the survey job that owns paths.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EmployeeId, Member, Path, Waypoint};

/// A survey project and every path walked within it.
///
/// Paths are kept in the order they were started. Paths from different
/// employees may interleave; ownership is recorded on each path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub circle: String,
    pub division: String,
    pub description: String,
    pub members: Vec<Member>,
    pub created_at: Timestamp,
    pub paths: Vec<Path>,
}

impl Project {
    /// Creates an empty project with no members and no paths.
    pub fn new(name: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            circle: String::new(),
            division: String::new(),
            description: String::new(),
            members: Vec::new(),
            created_at,
            paths: Vec::new(),
        }
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            circle: self.circle.clone(),
            division: self.division.clone(),
            description: self.description.clone(),
        }
    }

    pub fn is_member(&self, employee: &EmployeeId) -> bool {
        self.members.iter().any(|m| &m.id == employee)
    }

    pub fn member_name(&self, employee: &EmployeeId) -> Option<&str> {
        self.members
            .iter()
            .find(|m| &m.id == employee)
            .map(|m| m.name.as_str())
    }

    /// All waypoints in storage order: path by path, then within each path.
    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.paths.iter().flat_map(|p| p.waypoints.iter())
    }
}

/// Project context attached to reconstructed segments and report entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub circle: String,
    pub division: String,
    pub description: String,
}
