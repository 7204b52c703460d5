//! Waypoint: a single geotagged point recorded along a surveyed route.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EmployeeId;

/// One recorded survey point.
///
/// Waypoints are immutable once created. The equipment detail lists are
/// carried through untouched; nothing in Surveyor interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(flatten)]
    pub position: GeoPosition,

    /// Distance walked since the previous waypoint, as reported by the device.
    #[serde(default)]
    pub distance_from_previous: Option<f64>,

    /// Where this waypoint sits on its path.
    #[serde(flatten)]
    pub kind: WaypointKind,

    #[serde(flatten)]
    pub route: RouteInfo,

    /// Reference to an uploaded photo, if one was taken.
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub pole_details: Vec<serde_json::Value>,

    #[serde(default)]
    pub gps_details: Vec<serde_json::Value>,

    pub created_at: Timestamp,

    /// The employee who submitted the waypoint.
    pub created_by: EmployeeId,

    /// The employee whose path the waypoint belongs to.
    pub path_owner: EmployeeId,
}

impl Waypoint {
    /// Creates a waypoint with a fresh id and empty optional fields.
    pub fn new(
        kind: WaypointKind,
        position: GeoPosition,
        created_at: Timestamp,
        created_by: EmployeeId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            description: String::new(),
            position,
            distance_from_previous: None,
            kind,
            route: RouteInfo::default(),
            image: None,
            pole_details: Vec::new(),
            gps_details: Vec::new(),
            created_at,
            path_owner: created_by.clone(),
            created_by,
        }
    }

    pub fn is_start(&self) -> bool {
        self.kind == WaypointKind::Start
    }

    pub fn is_end(&self) -> bool {
        self.kind == WaypointKind::End
    }
}

/// Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Free-form route classification supplied by the surveyor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    #[serde(default)]
    pub route_type: Option<String>,

    #[serde(default)]
    pub route_starting_point: Option<String>,

    #[serde(default)]
    pub route_ending_point: Option<String>,
}

/// The role a waypoint plays on its path.
///
/// Serialized as the `isStart` / `isEnd` flag pair. A record with both
/// flags set is rejected when read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "KindFlags", into = "KindFlags")]
pub enum WaypointKind {
    /// Opens a new path.
    Start,

    /// Extends the open path.
    Mid,

    /// Closes the open path.
    End,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KindFlags {
    #[serde(default)]
    is_start: bool,
    #[serde(default)]
    is_end: bool,
}

impl TryFrom<KindFlags> for WaypointKind {
    type Error = String;

    fn try_from(flags: KindFlags) -> Result<Self, Self::Error> {
        match (flags.is_start, flags.is_end) {
            (true, true) => Err("waypoint cannot be both start and end".to_string()),
            (true, false) => Ok(Self::Start),
            (false, true) => Ok(Self::End),
            (false, false) => Ok(Self::Mid),
        }
    }
}

impl From<WaypointKind> for KindFlags {
    fn from(kind: WaypointKind) -> Self {
        Self {
            is_start: kind == WaypointKind::Start,
            is_end: kind == WaypointKind::End,
        }
    }
}
