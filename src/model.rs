//! Core data model for Surveyor.
//!
//! These types represent what a field survey records:
//! projects, the paths walked within them, and the waypoints along each path.

mod employee;
mod path;
mod project;
mod waypoint;

pub use employee::{EmployeeId, Member};
pub use path::Path;
pub use project::{Project, ProjectSummary};
pub use waypoint::{GeoPosition, RouteInfo, Waypoint, WaypointKind};
