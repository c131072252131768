//! # Parameter validation
//!
//! Every parameter file of the executable is loaded through [`load_validated`] so that a badly
//! tuned file is rejected at startup rather than producing odd behaviour in the field.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use util::params::{load, LoadError};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A parameter set which can check its own consistency.
pub trait Validate {
    fn validate(&self) -> Result<(), ParamsError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("Couldn't load parameters: {0}")]
    LoadError(LoadError),

    #[error("Parameter `{0}` must be positive, found {1}")]
    NotPositive(&'static str, f64),

    #[error("Band table `{0}` is not monotonic at entry {1}")]
    NonMonotonic(&'static str, usize),

    #[error("Damping factor at entry {0} must be in (0, 1], found {1}")]
    InvalidDampingFactor(usize, f64),

    #[error("Waypoint `{0}` is not a valid location")]
    InvalidWaypoint(String),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Load a parameter file relative to `$PHAROS_SW_ROOT/params` and validate it.
pub fn load_validated<P>(param_file_path: &str) -> Result<P, ParamsError>
where
    P: DeserializeOwned + Validate,
{
    let params: P = load(param_file_path).map_err(ParamsError::LoadError)?;
    params.validate()?;
    Ok(params)
}

/// Check that a value is strictly positive.
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive(name, value))
    }
}
