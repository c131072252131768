//! # Sensor interfaces
//!
//! The navigation core reads its position and heading through these traits, which are implemented
//! by buffers sitting in front of the real (or simulated) devices.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::geo::Location;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of the vehicle's current location.
pub trait LocationSource: Send + Sync {
    /// Get the most recent valid fix.
    fn current_location(&self) -> Result<Location, SensorError>;
}

/// A source of the vehicle's current heading.
pub trait HeadingSource: Send + Sync {
    /// Get the heading filtered over the last `window` readings.
    ///
    /// Units: radians, in the heading frame (see [`crate::geo`])
    fn filtered_heading(&self, window: usize) -> Result<f64, SensorError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a sensor could not provide a reading. All of them are expected to be transient.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    #[error("No new data is available")]
    NoNewData,

    #[error("Latest data is stale ({age_ms} ms old, maximum is {max_age_ms} ms)")]
    Stale { age_ms: u64, max_age_ms: u64 },
}
