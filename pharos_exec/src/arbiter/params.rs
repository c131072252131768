//! Parameters structure for the motion arbiter

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use motion_if::MotionType;
use serde::{Deserialize, Serialize};

use crate::params::{check_positive, ParamsError, Validate};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the motion arbiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterParams {
    /// Period between command refreshes sent to the drive.
    ///
    /// Units: milliseconds
    pub cycle_period_ms: u64,

    /// The platform being driven, selects the drive entry point.
    pub motion_type: MotionType,

    /// If true the motors are powered on when the arbiter is created.
    pub power_on_motors: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ArbiterParams {
    fn default() -> Self {
        Self {
            cycle_period_ms: 100,
            motion_type: MotionType::default(),
            power_on_motors: false,
        }
    }
}

impl Validate for ArbiterParams {
    fn validate(&self) -> Result<(), ParamsError> {
        check_positive("cycle_period_ms", self.cycle_period_ms as f64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_partial() {
        let p: ArbiterParams =
            util::params::load_str("motion_type = \"SegwayRmp50\"\npower_on_motors = true").unwrap();

        assert_eq!(p.cycle_period_ms, 100);
        assert_eq!(p.motion_type, MotionType::SegwayRmp50);
        assert!(p.power_on_motors);
        assert!(p.validate().is_ok());

        let p = ArbiterParams {
            cycle_period_ms: 0,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(ParamsError::NotPositive(_, _))));
    }
}
