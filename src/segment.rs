//! Segment extraction: replaying an employee's waypoints into path segments.
//!
//! Extraction works on the flattened waypoint stream rather than on stored
//! paths, so it recovers the same segments whatever order paths were stored
//! in relative to other employees. The stream is scanned in storage order;
//! it is not re-sorted by timestamp first.

use jiff::{Timestamp, civil::Date, tz::TimeZone};
use serde::Serialize;
use tracing::debug;

use crate::model::{EmployeeId, Project, ProjectSummary, Waypoint};

/// Whether a segment reached its end waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentStatus {
    Closed,
    Open,
}

/// A path recovered from the waypoint stream, dated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub project: ProjectSummary,
    pub status: SegmentStatus,

    /// UTC calendar day of the end waypoint, or of the first waypoint when open.
    pub date: Date,

    /// Timestamp of the same waypoint the date was taken from.
    pub sort_key: Timestamp,

    pub waypoints: Vec<Waypoint>,
}

impl Segment {
    /// Seals accumulated waypoints into a segment. Returns `None` when empty.
    fn seal(
        project: &ProjectSummary,
        status: SegmentStatus,
        waypoints: Vec<Waypoint>,
    ) -> Option<Self> {
        let anchor = match status {
            SegmentStatus::Closed => waypoints.last()?,
            SegmentStatus::Open => waypoints.first()?,
        };
        let sort_key = anchor.created_at;
        Some(Self {
            project: project.clone(),
            status,
            date: utc_date(sort_key),
            sort_key,
            waypoints,
        })
    }
}

/// The calendar day a timestamp falls on in UTC.
pub fn utc_date(timestamp: Timestamp) -> Date {
    timestamp.to_zoned(TimeZone::UTC).date()
}

/// Every waypoint the employee submitted to the project, in storage order.
///
/// This is the slice handed to spreadsheet, PDF, and map exporters.
pub fn employee_waypoints<'a>(project: &'a Project, employee: &EmployeeId) -> Vec<&'a Waypoint> {
    project
        .waypoints()
        .filter(|w| &w.created_by == employee)
        .collect()
}

/// Accumulator threaded through the scan.
#[derive(Default)]
struct Scan {
    closed: Vec<Segment>,
    current: Vec<Waypoint>,
}

/// Recovers the employee's closed segments, then a trailing open one if any.
///
/// A start always begins a fresh segment, discarding whatever was still
/// accumulating. Waypoints seen before any start are ignored.
pub fn extract_segments(project: &Project, employee: &EmployeeId) -> Vec<Segment> {
    let summary = project.summary();
    let scan = employee_waypoints(project, employee)
        .into_iter()
        .fold(Scan::default(), |mut scan, waypoint| {
            if waypoint.is_start() {
                if !scan.current.is_empty() {
                    debug!(
                        project = %project.id,
                        %employee,
                        dropped = scan.current.len(),
                        "start before end; discarding unterminated run"
                    );
                }
                scan.current = vec![waypoint.clone()];
            } else if !scan.current.is_empty() {
                scan.current.push(waypoint.clone());
            }

            if waypoint.is_end()
                && let Some(segment) = Segment::seal(
                    &summary,
                    SegmentStatus::Closed,
                    std::mem::take(&mut scan.current),
                )
            {
                scan.closed.push(segment);
            }
            scan
        });

    let mut segments = scan.closed;
    segments.extend(Segment::seal(&summary, SegmentStatus::Open, scan.current));
    debug!(project = %project.id, %employee, segments = segments.len(), "extracted segments");
    segments
}
