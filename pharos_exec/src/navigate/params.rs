//! Parameters structure for the navigator
//!
//! The default band tables were tuned in the field for a Traxxas chassis. Other platforms are
//! expected to supply their own tables through `nav.toml`, which only have to keep the same shape:
//! slower as the target gets closer, and more heavily damped as the robot goes faster.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use motion_if::Priority;
use serde::{Deserialize, Serialize};

use crate::params::{check_positive, ParamsError, Validate};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the navigator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavParams {
    /// Period of the navigation control loop.
    ///
    /// Units: milliseconds
    pub cycle_period_ms: u64,

    /// Distance from the destination under which the robot has arrived.
    ///
    /// Units: meters
    pub arrival_radius_m: f64,

    /// Distances to the destination greater than this are treated as a corrupt fix, which aborts
    /// the navigation.
    ///
    /// Units: meters
    pub sanity_ceiling_m: f64,

    /// Largest heading demand that will be sent, and the heading error above which the robot
    /// slows down to turn.
    ///
    /// Units: radians
    pub max_turn_angle_rad: f64,

    /// Speed used while turning sharply.
    ///
    /// Units: meters/second
    pub sharp_turn_speed_ms: f64,

    /// Beyond this distance the robot travels at the requested speed.
    ///
    /// Units: meters
    pub full_speed_distance_m: f64,

    /// Speed caps used on approach, ordered from far to near.
    pub approach_bands: Vec<ApproachBand>,

    /// Speed cap used when closer than every approach band.
    ///
    /// Units: meters/second
    pub final_approach_speed_ms: f64,

    /// Heading damping factors, ordered from slow to fast.
    pub heading_damping: Vec<DampingBand>,

    /// Damping factor used when faster than every damping band.
    pub max_speed_damping: f64,

    /// Number of compass readings to filter over.
    pub compass_filter_window: usize,

    /// Priority at which the navigator submits its tasks.
    pub priority: Priority,
}

/// A band of the approach speed table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApproachBand {
    /// The band applies when the distance to the destination is greater than this.
    ///
    /// Units: meters
    pub above_m: f64,

    /// Units: meters/second
    pub speed_cap_ms: f64,
}

/// A band of the heading damping table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampingBand {
    /// The band applies when the robot's speed is less than this.
    ///
    /// Units: meters/second
    pub below_speed_ms: f64,

    /// Multiplier applied to the clamped heading demand.
    pub factor: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavParams {
    fn default() -> Self {
        Self {
            cycle_period_ms: 200,
            arrival_radius_m: 1.5,
            sanity_ceiling_m: 2000.0,
            max_turn_angle_rad: 0.35,
            sharp_turn_speed_ms: 0.6,
            full_speed_distance_m: 6.0,
            approach_bands: vec![
                ApproachBand { above_m: 5.0, speed_cap_ms: 1.5 },
                ApproachBand { above_m: 4.0, speed_cap_ms: 1.0 },
                ApproachBand { above_m: 3.0, speed_cap_ms: 0.7 },
            ],
            final_approach_speed_ms: 0.5,
            heading_damping: vec![
                DampingBand { below_speed_ms: 0.4, factor: 1.0 },
                DampingBand { below_speed_ms: 0.6, factor: 0.8 },
                DampingBand { below_speed_ms: 0.8, factor: 0.7 },
                DampingBand { below_speed_ms: 1.0, factor: 0.6 },
                DampingBand { below_speed_ms: 1.2, factor: 0.5 },
                DampingBand { below_speed_ms: 1.4, factor: 0.35 },
                DampingBand { below_speed_ms: 1.6, factor: 0.25 },
            ],
            max_speed_damping: 0.15,
            compass_filter_window: 3,
            priority: Priority::Second,
        }
    }
}

impl Validate for NavParams {
    fn validate(&self) -> Result<(), ParamsError> {
        check_positive("cycle_period_ms", self.cycle_period_ms as f64)?;
        check_positive("arrival_radius_m", self.arrival_radius_m)?;
        check_positive(
            "sanity_ceiling_m - arrival_radius_m",
            self.sanity_ceiling_m - self.arrival_radius_m,
        )?;
        check_positive("max_turn_angle_rad", self.max_turn_angle_rad)?;
        check_positive("sharp_turn_speed_ms", self.sharp_turn_speed_ms)?;
        check_positive("final_approach_speed_ms", self.final_approach_speed_ms)?;
        check_positive("compass_filter_window", self.compass_filter_window as f64)?;

        // Approach bands: distances strictly decreasing from the full speed distance, caps never
        // increasing, and the final approach speed no faster than the last cap.
        let mut prev_above = self.full_speed_distance_m;
        let mut prev_cap = f64::INFINITY;
        for (i, band) in self.approach_bands.iter().enumerate() {
            if !(band.above_m < prev_above) || !(band.speed_cap_ms <= prev_cap) {
                return Err(ParamsError::NonMonotonic("approach_bands", i));
            }
            check_positive("speed_cap_ms", band.speed_cap_ms)?;
            prev_above = band.above_m;
            prev_cap = band.speed_cap_ms;
        }
        if !(self.final_approach_speed_ms <= prev_cap) {
            return Err(ParamsError::NonMonotonic(
                "approach_bands",
                self.approach_bands.len(),
            ));
        }

        // Damping bands: speeds strictly increasing, factors in (0, 1] and never increasing.
        let mut prev_below = 0.0;
        let mut prev_factor = 1.0;
        for (i, band) in self.heading_damping.iter().enumerate() {
            if !(band.factor > 0.0 && band.factor <= 1.0) {
                return Err(ParamsError::InvalidDampingFactor(i, band.factor));
            }
            if !(band.below_speed_ms > prev_below) || !(band.factor <= prev_factor) {
                return Err(ParamsError::NonMonotonic("heading_damping", i));
            }
            prev_below = band.below_speed_ms;
            prev_factor = band.factor;
        }
        let i = self.heading_damping.len();
        if !(self.max_speed_damping > 0.0 && self.max_speed_damping <= 1.0) {
            return Err(ParamsError::InvalidDampingFactor(i, self.max_speed_damping));
        }
        if !(self.max_speed_damping <= prev_factor) {
            return Err(ParamsError::NonMonotonic("heading_damping", i));
        }

        Ok(())
    }
}
