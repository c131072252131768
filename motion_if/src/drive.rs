//! # Drive interface
//!
//! The actuator-facing side of the motion system. Drive implementations are expected to stop the
//! vehicle themselves if they are not refreshed with a new command often enough, so the arbiter
//! re-sends the active command every cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::task::MotionCmd;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A device which accepts speed and heading commands.
///
/// Implementations must tolerate being sent the same command repeatedly.
pub trait DriveInterface: Send {
    /// Command the vehicle to move at `speed_ms` with heading demand `heading_rad`.
    fn set_speed(&mut self, speed_ms: f64, heading_rad: f64) -> Result<(), DriveError>;

    /// Command a car-like vehicle, where the heading demand is a steering angle.
    fn set_car_cmd(&mut self, speed_ms: f64, steering_rad: f64) -> Result<(), DriveError> {
        self.set_speed(speed_ms, steering_rad)
    }

    /// Switch the motors on or off. Only some platforms need this.
    fn set_motor_power(&mut self, _on: bool) -> Result<(), DriveError> {
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by a drive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriveError {
    #[error("Drive transport error: {0}")]
    Transport(String),

    #[error("The drive is not connected")]
    NotConnected,
}

/// The kind of mobility platform being driven, which determines how commands are delivered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionType {
    /// Car-like platform steered with an ackerman linkage.
    Traxxas,
    /// Differential drive platform.
    IRobotCreate,
    /// Differential drive platform, requires the motors to be powered on.
    SegwayRmp50,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionType {
    /// Deliver `cmd` to `drive` using the entry point appropriate for this platform.
    pub fn send(self, drive: &mut dyn DriveInterface, cmd: &MotionCmd) -> Result<(), DriveError> {
        match self {
            MotionType::Traxxas => drive.set_car_cmd(cmd.speed_ms, cmd.heading_rad),
            MotionType::IRobotCreate | MotionType::SegwayRmp50 => {
                drive.set_speed(cmd.speed_ms, cmd.heading_rad)
            }
        }
    }
}

impl Default for MotionType {
    fn default() -> Self {
        MotionType::Traxxas
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Calls {
        car: Vec<(f64, f64)>,
        speed: Vec<(f64, f64)>,
    }

    impl DriveInterface for Calls {
        fn set_speed(&mut self, speed_ms: f64, heading_rad: f64) -> Result<(), DriveError> {
            self.speed.push((speed_ms, heading_rad));
            Ok(())
        }

        fn set_car_cmd(&mut self, speed_ms: f64, steering_rad: f64) -> Result<(), DriveError> {
            self.car.push((speed_ms, steering_rad));
            Ok(())
        }
    }

    #[test]
    fn test_motion_type_entry_point() {
        let mut calls = Calls::default();
        let cmd = MotionCmd::new(1.0, 0.2);

        MotionType::Traxxas.send(&mut calls, &cmd).unwrap();
        MotionType::SegwayRmp50.send(&mut calls, &cmd).unwrap();
        MotionType::IRobotCreate.send(&mut calls, &MotionCmd::STOP).unwrap();

        assert_eq!(calls.car, vec![(1.0, 0.2)]);
        assert_eq!(calls.speed, vec![(1.0, 0.2), (0.0, 0.0)]);
    }
}
