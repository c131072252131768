//! # Motion interface library
//!
//! Types shared between the controllers that request motion, the arbiter which
//! decides which request reaches the vehicle, and the devices on either side
//! of them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod drive;
pub mod geo;
pub mod sensor;
pub mod task;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use drive::{DriveError, DriveInterface, MotionType};
pub use geo::{GeoRegion, Location};
pub use sensor::{HeadingSource, LocationSource, SensorError};
pub use task::{MotionCmd, MotionTask, Priority, TaskId};
