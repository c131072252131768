//! # Pharos library.
//!
//! This library allows other crates in the workspace (and the integration tests) to access items
//! defined inside the pharos crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Motion arbiter - serialises motion tasks from many controllers into one drive command stream
pub mod arbiter;

/// Mission definition and execution
pub mod mission;

/// Navigation - drives the robot to a GPS waypoint using the compass
pub mod navigate;

/// Shared parameter loading and validation
pub mod params;

/// Sensor buffers - hold the latest GPS fixes and compass headings
pub mod sensors;

/// Simulation - a kinematic robot model standing in for the real platform
pub mod sim;
