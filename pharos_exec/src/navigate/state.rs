//! Navigator state and outputs

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The state of the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavState {
    /// Not navigating.
    Idle,
    /// Driving towards the destination. Missing sensor data keeps the navigator in this state.
    Approaching,
    /// The last navigation reached its destination.
    Arrived,
    /// The last navigation was abandoned because the fix was implausibly far away.
    Aborted,
}

/// How a call to `Navigator::navigate` ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NavOutcome {
    Arrived,

    /// Aborted at the given distance from the destination (meters).
    Aborted(f64),

    /// Stopped by `Navigator::stop`.
    Cancelled,
}

/// Result of a single control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CycleStep {
    Continue,
    Arrived,
    Aborted(f64),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Archived record of a single control cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NavCycleRecord {
    /// Units: seconds since the start of the session
    pub time_s: f64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub heading_rad: f64,
    pub distance_m: f64,
    pub heading_error_rad: f64,
    pub speed_cmd_ms: f64,
    pub heading_cmd_rad: f64,
}

impl NavOutcome {
    pub fn is_arrived(&self) -> bool {
        matches!(self, NavOutcome::Arrived)
    }
}
