//! GPS fix buffer

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{trace, warn};
use motion_if::{GeoRegion, Location, LocationSource, SensorError};
use serde::{Deserialize, Serialize};
use util::{logger::LogContext, sched::lock_mutex, time::millis};

use crate::params::{check_positive, ParamsError, Validate};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsBufferParams {
    /// Fixes older than this are discarded.
    ///
    /// Units: milliseconds
    pub max_age_ms: u64,

    /// Maximum number of fixes held.
    pub capacity: usize,

    /// If set, fixes outside this region are rejected.
    pub valid_region: Option<GeoRegion>,
}

/// Buffer of the most recent GPS fixes, newest first.
#[derive(Debug)]
pub struct GpsDataBuffer {
    params: GpsBufferParams,
    log: LogContext,
    fixes: Mutex<VecDeque<TimedFix>>,
}

#[derive(Debug, Clone, Copy)]
struct TimedFix {
    loc: Location,
    received: Instant,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for GpsBufferParams {
    fn default() -> Self {
        Self {
            max_age_ms: 5000,
            capacity: 10,
            valid_region: None,
        }
    }
}

impl Validate for GpsBufferParams {
    fn validate(&self) -> Result<(), ParamsError> {
        check_positive("gps.max_age_ms", self.max_age_ms as f64)?;
        check_positive("gps.capacity", self.capacity as f64)
    }
}

impl GpsDataBuffer {
    pub fn new(params: GpsBufferParams, log: LogContext) -> Self {
        let capacity = params.capacity;
        Self {
            params,
            log,
            fixes: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Add a fix received now. Returns `false` if the fix was rejected.
    pub fn push(&self, loc: Location) -> bool {
        self.push_at(loc, Instant::now())
    }

    /// Add a fix received at the given instant. Returns `false` if the fix was rejected.
    pub fn push_at(&self, loc: Location, received: Instant) -> bool {
        if !loc.is_valid() {
            warn!(target: self.log.target(), "Rejected invalid GPS fix {}", loc);
            return false;
        }

        if let Some(region) = &self.params.valid_region {
            if !region.contains(&loc) {
                warn!(target: self.log.target(), "Rejected GPS fix {} outside the valid region", loc);
                return false;
            }
        }

        let mut fixes = lock_mutex(&self.fixes);
        fixes.push_front(TimedFix { loc, received });
        fixes.truncate(self.params.capacity);

        trace!(target: self.log.target(), "GPS fix {}", loc);

        true
    }

    /// Estimate the speed over ground from the two newest fixes.
    ///
    /// Units: meters/second
    pub fn speed_estimate_ms(&self) -> Option<f64> {
        let fixes = lock_mutex(&self.fixes);

        let newest = fixes.get(0)?;
        let previous = fixes.get(1)?;

        let dt_s = newest
            .received
            .checked_duration_since(previous.received)?
            .as_secs_f64();

        if dt_s > 0.0 {
            Some(previous.loc.distance_to(&newest.loc) / dt_s)
        } else {
            None
        }
    }

    /// Number of fixes currently held, including any that have expired but not been read.
    pub fn len(&self) -> usize {
        lock_mutex(&self.fixes).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn max_age(&self) -> Duration {
        millis(self.params.max_age_ms)
    }
}

impl LocationSource for GpsDataBuffer {
    fn current_location(&self) -> Result<Location, SensorError> {
        let now = Instant::now();
        let max_age = self.max_age();
        let mut fixes = lock_mutex(&self.fixes);

        fixes.retain(|f| now.saturating_duration_since(f.received) <= max_age);

        fixes
            .front()
            .map(|f| f.loc)
            .ok_or(SensorError::NoNewData)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn origin() -> Location {
        Location::new(30.2655183, -97.7690083)
    }

    #[test]
    fn test_newest_fix_returned() {
        let buf = GpsDataBuffer::new(GpsBufferParams::default(), LogContext::default());
        assert_eq!(buf.current_location(), Err(SensorError::NoNewData));

        let a = origin();
        let b = a.offset_by(1.0, 0.0);
        assert!(buf.push(a));
        assert!(buf.push(b));

        assert_eq!(buf.current_location(), Ok(b));
    }

    #[test]
    fn test_rejects_invalid_and_out_of_region() {
        let params = GpsBufferParams {
            valid_region: Some(GeoRegion {
                min_latitude_deg: 30.0,
                max_latitude_deg: 31.0,
                min_longitude_deg: -98.0,
                max_longitude_deg: -97.0,
            }),
            ..Default::default()
        };
        let buf = GpsDataBuffer::new(params, LogContext::default());

        assert!(!buf.push(Location::new(0.0, 0.0)));
        assert!(!buf.push(Location::new(f64::NAN, -97.5)));
        assert!(!buf.push(Location::new(40.0, -97.5)));
        assert!(buf.is_empty());

        assert!(buf.push(origin()));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_expiry() {
        let params = GpsBufferParams {
            max_age_ms: 100,
            ..Default::default()
        };
        let buf = GpsDataBuffer::new(params, LogContext::default());
        let now = Instant::now();

        let old = origin();
        let new = old.offset_by(5.0, 0.0);
        buf.push_at(old, now - Duration::from_millis(500));
        assert_eq!(buf.current_location(), Err(SensorError::NoNewData));
        assert!(buf.is_empty());

        buf.push_at(old, now - Duration::from_millis(500));
        buf.push_at(new, now);
        assert_eq!(buf.current_location(), Ok(new));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_capacity() {
        let params = GpsBufferParams {
            capacity: 3,
            ..Default::default()
        };
        let buf = GpsDataBuffer::new(params, LogContext::default());

        for i in 0..10 {
            buf.push(origin().offset_by(i as f64, 0.0));
        }

        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_speed_estimate() {
        let buf = GpsDataBuffer::new(GpsBufferParams::default(), LogContext::default());
        let now = Instant::now();

        buf.push_at(origin(), now - Duration::from_secs(2));
        assert_eq!(buf.speed_estimate_ms(), None);

        buf.push_at(origin().offset_by(3.0, 0.0), now);
        let v = buf.speed_estimate_ms().unwrap();
        assert!((v - 1.5).abs() < 1e-3, "speed was {}", v);
    }
}
