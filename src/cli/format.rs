//! Output formatting for CLI display.

use crate::assemble::Placement;
use crate::model::Path;

/// Describe where a waypoint was placed, numbering paths from 1.
pub(super) fn format_placement(placement: Placement) -> String {
    match placement {
        Placement::Started { path_index } => format!("started path {}", path_index + 1),
        Placement::Extended { path_index } => format!("extended path {}", path_index + 1),
        Placement::Closed { path_index } => format!("closed path {}", path_index + 1),
    }
}

/// One line per path for `project show`.
pub(super) fn format_path_line(index: usize, path: &Path) -> String {
    let state = if path.is_open() { "open" } else { "closed" };
    let count = path.waypoints.len();
    let noun = if count == 1 { "waypoint" } else { "waypoints" };
    format!("{:>3}. {}  [{state}]  {count} {noun}", index + 1, path.owner)
}
