//! # Navigation control law
//!
//! Pure functions turning the robot's position and heading into a speed and heading demand.
//!
//! Heading errors follow the heading frame: a positive error means the target lies to the left and
//! the robot should turn left, a negative error means turn right.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use motion_if::Location;
use serde::Serialize;
use util::maths::{ang_dist, clamp_abs};

use super::NavParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Where the destination lies relative to the robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetDirection {
    /// Units: meters
    pub distance_m: f64,

    /// Units: radians, in (-pi, pi]
    pub heading_error_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The signed turn needed to go from `curr_heading_rad` to `angle_to_target_rad`.
pub fn heading_error(curr_heading_rad: f64, angle_to_target_rad: f64) -> f64 {
    ang_dist(curr_heading_rad, angle_to_target_rad)
}

/// Locate the destination relative to the robot's current fix and heading.
pub fn locate_target(curr: &Location, curr_heading_rad: f64, dest: &Location) -> TargetDirection {
    TargetDirection {
        distance_m: curr.distance_to(dest),
        heading_error_rad: heading_error(curr_heading_rad, curr.bearing_to(dest)),
    }
}

/// Calculate the speed to drive at.
///
/// Sharp turns are taken slowly. Otherwise the requested speed is used until the robot is within
/// the full speed distance, after which it is capped ever lower as the destination approaches.
pub fn calc_controlled_velocity(
    params: &NavParams,
    distance_m: f64,
    desired_velocity_ms: f64,
    heading_error_rad: f64,
) -> f64 {
    if heading_error_rad.abs() > params.max_turn_angle_rad {
        return desired_velocity_ms.min(params.sharp_turn_speed_ms);
    }

    if distance_m > params.full_speed_distance_m {
        return desired_velocity_ms;
    }

    desired_velocity_ms.min(speed_cap(params, distance_m))
}

/// Calculate the heading demand to send.
///
/// The heading error is clamped to the maximum turn angle then damped more heavily the faster the
/// robot goes, which stops it weaving at speed.
pub fn calc_controlled_heading(params: &NavParams, velocity_ms: f64, heading_error_rad: f64) -> f64 {
    damping_factor(params, velocity_ms) * clamp_abs(heading_error_rad, params.max_turn_angle_rad)
}

/// The approach speed cap at the given distance.
pub fn speed_cap(params: &NavParams, distance_m: f64) -> f64 {
    params
        .approach_bands
        .iter()
        .find(|b| distance_m > b.above_m)
        .map(|b| b.speed_cap_ms)
        .unwrap_or(params.final_approach_speed_ms)
}

/// The heading damping factor at the given speed.
pub fn damping_factor(params: &NavParams, velocity_ms: f64) -> f64 {
    params
        .heading_damping
        .iter()
        .find(|b| velocity_ms < b.below_speed_ms)
        .map(|b| b.factor)
        .unwrap_or(params.max_speed_damping)
}
