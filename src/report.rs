//! Report aggregation: an employee's segments grouped by day and project.
//!
//! Output is ordered most recent day first. Within a day, projects appear
//! in the order their most recent segment was seen, and each project's
//! segments are merged into one waypoint list.

use std::cmp::Reverse;

use jiff::{Timestamp, civil::Date};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{EmployeeId, Project, ProjectSummary, Waypoint};
use crate::segment::{Segment, extract_segments};

/// One project's waypoints for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub date: Date,
    pub project: ProjectSummary,
    pub waypoints: Vec<WaypointView>,
}

/// A waypoint as presented in reports and exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub route_type: Option<String>,
    pub route_starting_point: Option<String>,
    pub route_ending_point: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_from_previous: Option<f64>,
    pub is_start: bool,
    pub is_end: bool,
    pub image: Option<String>,
    pub pole_details: Vec<serde_json::Value>,
    pub gps_details: Vec<serde_json::Value>,
    pub created_at: Timestamp,
    pub created_by: CreatorView,
}

/// The submitting employee, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatorView {
    pub id: EmployeeId,

    /// Member name on the owning project, when the employee is enrolled.
    pub name: Option<String>,
}

impl WaypointView {
    pub fn new(waypoint: &Waypoint, creator_name: Option<&str>) -> Self {
        Self {
            id: waypoint.id,
            name: waypoint.name.clone(),
            description: waypoint.description.clone(),
            route_type: waypoint.route.route_type.clone(),
            route_starting_point: waypoint.route.route_starting_point.clone(),
            route_ending_point: waypoint.route.route_ending_point.clone(),
            latitude: waypoint.position.latitude,
            longitude: waypoint.position.longitude,
            distance_from_previous: waypoint.distance_from_previous,
            is_start: waypoint.is_start(),
            is_end: waypoint.is_end(),
            image: waypoint.image.clone(),
            pole_details: waypoint.pole_details.clone(),
            gps_details: waypoint.gps_details.clone(),
            created_at: waypoint.created_at,
            created_by: CreatorView {
                id: waypoint.created_by.clone(),
                name: creator_name.map(String::from),
            },
        }
    }
}

/// Rebuilds the employee's survey history across `projects` for display.
///
/// Returns an empty list when the employee has no segments anywhere.
pub fn reconstruct(projects: &[Project], employee: &EmployeeId) -> Vec<ReportEntry> {
    let mut segments: Vec<Segment> = projects
        .iter()
        .flat_map(|p| extract_segments(p, employee))
        .collect();
    segments.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));

    let mut days: Vec<(Date, Vec<Segment>)> = Vec::new();
    for segment in segments {
        match days.iter_mut().find(|(date, _)| *date == segment.date) {
            Some((_, group)) => group.push(segment),
            None => days.push((segment.date, vec![segment])),
        }
    }
    // Day groups are already newest first; this keeps the date-string order explicit.
    days.sort_by_cached_key(|(date, _)| Reverse(date.to_string()));

    let creator_name = |project_id: Uuid| {
        projects
            .iter()
            .find(|p| p.id == project_id)
            .and_then(|p| p.member_name(employee))
    };

    days.into_iter()
        .flat_map(|(date, group)| merge_by_project(date, group, &creator_name))
        .collect()
}

/// Merges one day's segments into an entry per project, in first-seen order.
fn merge_by_project<'a>(
    date: Date,
    segments: Vec<Segment>,
    creator_name: &impl Fn(Uuid) -> Option<&'a str>,
) -> Vec<ReportEntry> {
    let mut entries: Vec<ReportEntry> = Vec::new();
    for segment in segments {
        let name = creator_name(segment.project.id);
        let views = segment.waypoints.iter().map(|w| WaypointView::new(w, name));
        match entries.iter_mut().find(|e| e.project.id == segment.project.id) {
            Some(entry) => entry.waypoints.extend(views),
            None => {
                let waypoints = views.collect();
                entries.push(ReportEntry {
                    date,
                    project: segment.project,
                    waypoints,
                });
            }
        }
    }
    entries
}
