//! # Simulation
//!
//! A kinematic bicycle model of a car-like robot. The model integrates the last command it was
//! given and publishes perfect GPS fixes and compass headings into the sensor buffers at their
//! configured rates, which lets the whole motion stack run without any hardware.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use motion_if::{DriveError, DriveInterface, Location};
use serde::{Deserialize, Serialize};
use util::{
    logger::LogContext,
    maths::{clamp_abs, wrap_pi},
    sched::{lock_mutex, Periodic},
};

use crate::{
    params::{check_positive, ParamsError, Validate},
    sensors::{CompassDataBuffer, GpsDataBuffer},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the simulated robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Period of the simulation step.
    ///
    /// Units: milliseconds
    pub step_period_ms: u64,

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Units: radians
    pub max_steer_rad: f64,

    /// Period between published GPS fixes.
    ///
    /// Units: milliseconds
    pub gps_period_ms: u64,

    /// Period between published compass headings.
    ///
    /// Units: milliseconds
    pub compass_period_ms: u64,

    /// Where the robot starts.
    pub start: Location,

    /// Units: radians, heading frame
    pub start_heading_rad: f64,
}

/// The simulated robot.
///
/// Cloning gives another handle to the same robot.
#[derive(Clone)]
pub struct SimRobot {
    params: SimParams,
    log: LogContext,
    state: Arc<Mutex<SimState>>,
    gps: Arc<GpsDataBuffer>,
    compass: Arc<CompassDataBuffer>,
}

/// Drive interface of the simulated robot.
pub struct SimDrive {
    state: Arc<Mutex<SimState>>,
}

#[derive(Debug, Clone)]
struct SimState {
    location: Location,
    heading_rad: f64,

    speed_dem_ms: f64,
    steer_dem_rad: f64,

    since_gps_s: f64,
    since_compass_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            step_period_ms: 20,
            wheelbase_m: 0.33,
            max_speed_ms: 3.0,
            max_steer_rad: 0.35,
            gps_period_ms: 200,
            compass_period_ms: 100,
            start: Location::new(30.2655183, -97.7690083),
            start_heading_rad: 0.0,
        }
    }
}

impl Validate for SimParams {
    fn validate(&self) -> Result<(), ParamsError> {
        check_positive("step_period_ms", self.step_period_ms as f64)?;
        check_positive("wheelbase_m", self.wheelbase_m)?;
        check_positive("max_speed_ms", self.max_speed_ms)?;
        check_positive("max_steer_rad", self.max_steer_rad)?;
        check_positive("gps_period_ms", self.gps_period_ms as f64)?;
        check_positive("compass_period_ms", self.compass_period_ms as f64)
    }
}

impl SimRobot {
    pub fn new(
        params: SimParams,
        gps: Arc<GpsDataBuffer>,
        compass: Arc<CompassDataBuffer>,
        log: LogContext,
    ) -> Self {
        let state = SimState {
            location: params.start,
            heading_rad: wrap_pi(params.start_heading_rad),
            speed_dem_ms: 0.0,
            steer_dem_rad: 0.0,
            // Publish on the first step
            since_gps_s: f64::INFINITY,
            since_compass_s: f64::INFINITY,
        };

        Self {
            params,
            log,
            state: Arc::new(Mutex::new(state)),
            gps,
            compass,
        }
    }

    /// A drive interface commanding this robot.
    pub fn drive(&self) -> SimDrive {
        SimDrive {
            state: self.state.clone(),
        }
    }

    pub fn location(&self) -> Location {
        lock_mutex(&self.state).location
    }

    pub fn heading_rad(&self) -> f64 {
        lock_mutex(&self.state).heading_rad
    }

    /// Advance the simulation by `dt_s` seconds.
    pub fn step(&self, dt_s: f64) {
        let mut state = lock_mutex(&self.state);

        let speed_ms = clamp_abs(state.speed_dem_ms, self.params.max_speed_ms);
        let steer_rad = clamp_abs(state.steer_dem_rad, self.params.max_steer_rad);

        // Bicycle model, positive steer turns anticlockwise
        let yaw_rate_rads = speed_ms / self.params.wheelbase_m * steer_rad.tan();
        let heading_rad = state.heading_rad + 0.5 * yaw_rate_rads * dt_s;

        let dist_m = speed_ms * dt_s;
        state.location = state
            .location
            .offset_by(dist_m * heading_rad.cos(), -dist_m * heading_rad.sin());
        state.heading_rad = wrap_pi(state.heading_rad + yaw_rate_rads * dt_s);

        state.since_gps_s += dt_s;
        if state.since_gps_s * 1000.0 >= self.params.gps_period_ms as f64 {
            state.since_gps_s = 0.0;
            self.gps.push(state.location);
        }

        state.since_compass_s += dt_s;
        if state.since_compass_s * 1000.0 >= self.params.compass_period_ms as f64 {
            state.since_compass_s = 0.0;
            self.compass.push(state.heading_rad);
        }
    }

    /// Run the simulation in real time on its own thread, stepping once every `period`.
    pub fn spawn(&self, period: Duration) -> std::io::Result<Periodic> {
        let robot = self.clone();
        let dt_s = period.as_secs_f64();

        debug!(
            target: self.log.target(),
            "Simulation starting at {} heading {:.3} rad",
            self.location(),
            self.heading_rad()
        );

        Periodic::spawn("sim", period, move || robot.step(dt_s))
    }
}

impl DriveInterface for SimDrive {
    fn set_speed(&mut self, speed_ms: f64, heading_rad: f64) -> Result<(), DriveError> {
        let mut state = lock_mutex(&self.state);
        state.speed_dem_ms = speed_ms;
        state.steer_dem_rad = heading_rad;
        Ok(())
    }
}
