//! # Missions
//!
//! A mission is an ordered list of waypoints which the navigator visits in turn.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Instant;

use log::{info, warn};
use motion_if::Location;
use serde::{Deserialize, Serialize};
use util::{logger::LogContext, time::millis};

use crate::{
    navigate::{NavOutcome, Navigator},
    params::{check_positive, ParamsError, Validate},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionParams {
    /// Speed to travel between waypoints unless the waypoint gives its own.
    ///
    /// Units: meters/second
    pub cruise_speed_ms: f64,

    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,

    pub location: Location,

    /// Units: meters/second
    #[serde(default)]
    pub speed_ms: Option<f64>,

    /// Time to wait at the waypoint after arriving.
    ///
    /// Units: milliseconds
    #[serde(default)]
    pub pause_ms: u64,
}

/// The result of running a mission, saved into the session at the end of the run.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub waypoints: Vec<WaypointReport>,
    pub reached: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaypointReport {
    pub name: String,
    pub target: Location,
    pub outcome: NavOutcome,

    /// Units: seconds
    pub elapsed_s: f64,

    /// Units: meters
    pub final_distance_m: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Validate for MissionParams {
    fn validate(&self) -> Result<(), ParamsError> {
        check_positive("cruise_speed_ms", self.cruise_speed_ms)?;

        for wp in &self.waypoints {
            if !wp.location.is_valid() {
                return Err(ParamsError::InvalidWaypoint(wp.name.clone()));
            }
            if let Some(speed_ms) = wp.speed_ms {
                check_positive("waypoint speed_ms", speed_ms)?;
            }
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Visit each waypoint of the mission in order.
///
/// A waypoint which is aborted is skipped. If the navigator is stopped, whether while driving or
/// while pausing at a waypoint, the rest of the mission is abandoned.
pub fn run_mission(mission: &MissionParams, nav: &Navigator, log: &LogContext) -> MissionReport {
    nav.clear_stop();

    let mut report = MissionReport {
        waypoints: Vec::with_capacity(mission.waypoints.len()),
        reached: 0,
        total: mission.waypoints.len(),
    };

    for (i, wp) in mission.waypoints.iter().enumerate() {
        let speed_ms = wp.speed_ms.unwrap_or(mission.cruise_speed_ms);

        info!(
            target: log.target(),
            "Waypoint {}/{} \"{}\" at {}",
            i + 1,
            report.total,
            wp.name,
            wp.location
        );

        let start = Instant::now();
        let outcome = nav.navigate_unless_stopped(wp.location, speed_ms);

        report.waypoints.push(WaypointReport {
            name: wp.name.clone(),
            target: wp.location,
            outcome,
            elapsed_s: start.elapsed().as_secs_f64(),
            final_distance_m: nav.last_distance_m(),
        });

        match outcome {
            NavOutcome::Arrived => {
                report.reached += 1;
                if wp.pause_ms > 0 && nav.pause(millis(wp.pause_ms)) {
                    warn!(target: log.target(), "Mission cancelled at waypoint \"{}\"", wp.name);
                    break;
                }
            }
            NavOutcome::Aborted(d) => warn!(
                target: log.target(),
                "Skipping waypoint \"{}\", navigation aborted {:.1} m away",
                wp.name,
                d
            ),
            NavOutcome::Cancelled => {
                warn!(target: log.target(), "Mission cancelled at waypoint \"{}\"", wp.name);
                break;
            }
        }
    }

    info!(
        target: log.target(),
        "Mission complete, reached {} of {} waypoints",
        report.reached,
        report.total
    );

    report
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::navigate::test::{dest, setup, Script};
    use std::{sync::Arc, time::Duration};

    #[test]
    fn test_load_mission() {
        let mission: MissionParams = util::params::load_str(
            r#"
            cruise_speed_ms = 1.2

            [[waypoints]]
            name = "gate"
            location = { latitude_deg = 30.2656, longitude_deg = -97.7690 }

            [[waypoints]]
            name = "tree"
            location = { latitude_deg = 30.2657, longitude_deg = -97.7691 }
            speed_ms = 0.8
            pause_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(mission.waypoints.len(), 2);
        assert_eq!(mission.waypoints[0].speed_ms, None);
        assert_eq!(mission.waypoints[1].pause_ms, 500);
        assert!(mission.validate().is_ok());

        let mut bad = mission.clone();
        bad.waypoints[1].location = Location::new(0.0, 0.0);
        assert!(matches!(
            bad.validate(),
            Err(ParamsError::InvalidWaypoint(name)) if name == "tree"
        ));
    }

    #[test]
    fn test_stop_during_pause_ends_mission() {
        let d = dest();
        let gps = Script::new(vec![Ok(d)]);
        let compass = Script::new(vec![Ok(0.0)]);
        let (nav, _, _) = setup(gps, compass);
        let nav = Arc::new(nav);

        // Both waypoints are within the arrival radius of the fix
        let mission = MissionParams {
            cruise_speed_ms: 1.0,
            waypoints: vec![
                Waypoint {
                    name: "here".into(),
                    location: d.offset_by(0.5, 0.0),
                    speed_ms: None,
                    pause_ms: 2000,
                },
                Waypoint {
                    name: "next".into(),
                    location: d.offset_by(1.0, 0.0),
                    speed_ms: None,
                    pause_ms: 0,
                },
            ],
        };

        let start = Instant::now();
        let runner = {
            let nav = nav.clone();
            std::thread::spawn(move || run_mission(&mission, &nav, &LogContext::default()))
        };

        std::thread::sleep(Duration::from_millis(250));
        nav.stop();
        let report = runner.join().unwrap();

        assert!(start.elapsed() < Duration::from_millis(1500));
        assert_eq!(report.waypoints.len(), 1);
        assert_eq!(report.waypoints[0].name, "here");
        assert_eq!(report.reached, 1);
        assert_eq!(report.total, 2);

        // A stale stop doesn't leak into the next mission
        let mission = MissionParams {
            cruise_speed_ms: 1.0,
            waypoints: vec![Waypoint {
                name: "again".into(),
                location: d.offset_by(0.5, 0.0),
                speed_ms: None,
                pause_ms: 0,
            }],
        };
        assert_eq!(run_mission(&mission, &nav, &LogContext::default()).reached, 1);
    }
}
