//! # Sensor buffers
//!
//! Thread safe buffers sitting between the sensor drivers (or the simulation) and the navigator.
//! Drivers push readings in as they arrive, and readers always get a consistent snapshot of the
//! latest valid data.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod compass;
mod gps;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::params::{ParamsError, Validate};

pub use compass::{CompassBufferParams, CompassDataBuffer};
pub use gps::{GpsBufferParams, GpsDataBuffer};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for all sensor buffers, as stored in `sensors.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsParams {
    pub gps: GpsBufferParams,
    pub compass: CompassBufferParams,
}

impl Validate for SensorsParams {
    fn validate(&self) -> Result<(), ParamsError> {
        self.gps.validate()?;
        self.compass.validate()
    }
}
