//! Waypoint commands: add, list.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use jiff::Timestamp;

use crate::assemble::{SubmitError, submit_waypoint};
use crate::config::Config;
use crate::identity::resolve_employee;
use crate::model::{EmployeeId, GeoPosition, RouteInfo, Waypoint, WaypointKind};
use crate::report::WaypointView;
use crate::segment::employee_waypoints;
use crate::storage::Storage;

use super::format::format_placement;
use super::{emit_json, resolve_project, short_id};

#[derive(Debug, Subcommand)]
pub enum WaypointCommand {
    /// Record a waypoint on the acting employee's path. Prints the waypoint ID.
    ///
    /// `--start` opens a path, `--end` closes it, neither extends it.
    /// Rejected if it would leave the employee with two open paths,
    /// or with a midpoint or end that belongs to no path.
    Add {
        /// Project ID: full UUID or unambiguous prefix.
        #[arg(long)]
        project: String,

        /// Latitude in decimal degrees.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees.
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Short name for the point (e.g. a pole number).
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// This waypoint opens a new path.
        #[arg(long, conflicts_with = "end")]
        start: bool,

        /// This waypoint closes the open path.
        #[arg(long)]
        end: bool,

        /// Distance from the previous waypoint, in meters.
        #[arg(long)]
        distance: Option<f64>,

        #[arg(long)]
        route_type: Option<String>,

        #[arg(long)]
        route_start: Option<String>,

        #[arg(long)]
        route_end: Option<String>,

        /// Reference to an already uploaded photo.
        #[arg(long)]
        image: Option<String>,

        /// JSON file holding an array of pole detail records.
        #[arg(long)]
        poles: Option<PathBuf>,

        /// JSON file holding an array of GPS equipment records.
        #[arg(long)]
        gps: Option<PathBuf>,
    },

    /// Print the acting employee's waypoints in a project as JSON, in storage order.
    List {
        /// Project ID: full UUID or unambiguous prefix.
        #[arg(long)]
        project: String,

        /// Write the JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub(super) fn run(
    command: WaypointCommand,
    employee: Option<&str>,
    config: &Config,
    storage: &Storage,
) -> Result<(), String> {
    let employee = resolve_employee(employee, config)?;
    match command {
        WaypointCommand::Add {
            project,
            lat,
            lng,
            name,
            description,
            start,
            end,
            distance,
            route_type,
            route_start,
            route_end,
            image,
            poles,
            gps,
        } => {
            let kind = match (start, end) {
                (true, _) => WaypointKind::Start,
                (_, true) => WaypointKind::End,
                _ => WaypointKind::Mid,
            };
            let mut waypoint = Waypoint::new(
                kind,
                GeoPosition::new(lat, lng),
                Timestamp::now(),
                employee.clone(),
            );
            waypoint.name = name;
            waypoint.description = description;
            waypoint.distance_from_previous = distance;
            waypoint.route = RouteInfo {
                route_type,
                route_starting_point: route_start,
                route_ending_point: route_end,
            };
            waypoint.image = image;
            waypoint.pole_details = read_records(poles.as_deref())?;
            waypoint.gps_details = read_records(gps.as_deref())?;
            cmd_add(storage, &project, &employee, waypoint)
        }
        WaypointCommand::List { project, out } => {
            cmd_list(storage, &project, &employee, out.as_deref())
        }
    }
}

fn cmd_add(
    storage: &Storage,
    project_ref: &str,
    employee: &EmployeeId,
    waypoint: Waypoint,
) -> Result<(), String> {
    let project = resolve_project(storage, project_ref)?;
    if !project.is_member(employee) {
        return Err(format!(
            "{employee} is not a member of project {}",
            short_id(project.id)
        ));
    }

    let id = waypoint.id;
    let placement = submit_waypoint(storage, project.id, employee, waypoint).map_err(|e| match e {
        SubmitError::Conflict(conflict) => format!("waypoint rejected: {conflict}"),
        SubmitError::Storage(e) => format!("failed to record waypoint: {e}"),
    })?;

    println!("{id}");
    eprintln!("{} in {}", format_placement(placement), short_id(project.id));
    Ok(())
}

fn cmd_list(
    storage: &Storage,
    project_ref: &str,
    employee: &EmployeeId,
    out: Option<&Path>,
) -> Result<(), String> {
    let project = resolve_project(storage, project_ref)?;
    let name = project.member_name(employee);
    let views: Vec<WaypointView> = employee_waypoints(&project, employee)
        .into_iter()
        .map(|w| WaypointView::new(w, name))
        .collect();
    emit_json(&views, out)
}

/// Read an optional JSON array of opaque equipment records.
fn read_records(path: Option<&Path>) -> Result<Vec<serde_json::Value>, String> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let contents =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("expected a JSON array in {}: {e}", path.display()))
}
