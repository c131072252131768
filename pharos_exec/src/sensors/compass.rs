//! Compass heading buffer
//!
//! Headings are in the heading frame, see [`motion_if::geo`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::sync::Mutex;
use std::time::Instant;

use log::{trace, warn};
use motion_if::{HeadingSource, SensorError};
use serde::{Deserialize, Serialize};
use util::{
    logger::LogContext,
    maths::{ang_dist, median, wrap_pi},
    sched::lock_mutex,
    time::millis,
};

use crate::params::{check_positive, ParamsError, Validate};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassBufferParams {
    /// If the newest heading is older than this the buffer is stale.
    ///
    /// Units: milliseconds
    pub max_age_ms: u64,

    /// Number of headings held.
    pub capacity: usize,
}

/// Ring buffer of the most recent compass headings, newest first.
#[derive(Debug)]
pub struct CompassDataBuffer {
    params: CompassBufferParams,
    log: LogContext,
    headings: Mutex<VecDeque<TimedHeading>>,
}

#[derive(Debug, Clone, Copy)]
struct TimedHeading {
    heading_rad: f64,
    received: Instant,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CompassBufferParams {
    fn default() -> Self {
        Self {
            max_age_ms: 800,
            capacity: 3,
        }
    }
}

impl Validate for CompassBufferParams {
    fn validate(&self) -> Result<(), ParamsError> {
        check_positive("compass.max_age_ms", self.max_age_ms as f64)?;
        check_positive("compass.capacity", self.capacity as f64)
    }
}

impl CompassDataBuffer {
    pub fn new(params: CompassBufferParams, log: LogContext) -> Self {
        let capacity = params.capacity;
        Self {
            params,
            log,
            headings: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Add a heading received now. Returns `false` if the heading was rejected.
    pub fn push(&self, heading_rad: f64) -> bool {
        self.push_at(heading_rad, Instant::now())
    }

    /// Add a heading received at the given instant. Returns `false` if the heading was rejected.
    pub fn push_at(&self, heading_rad: f64, received: Instant) -> bool {
        if !(heading_rad >= -PI && heading_rad <= PI) {
            warn!(target: self.log.target(), "Rejected compass heading {}", heading_rad);
            return false;
        }

        let mut headings = lock_mutex(&self.headings);
        headings.push_front(TimedHeading {
            heading_rad,
            received,
        });
        headings.truncate(self.params.capacity);

        trace!(target: self.log.target(), "Compass heading {:.4}", heading_rad);

        true
    }

    pub fn len(&self) -> usize {
        lock_mutex(&self.headings).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HeadingSource for CompassDataBuffer {
    /// The median of the newest `window` headings.
    ///
    /// Headings are unwrapped around the newest one before taking the median, so readings either
    /// side of +/- pi are treated as neighbours.
    fn filtered_heading(&self, window: usize) -> Result<f64, SensorError> {
        let mut headings = lock_mutex(&self.headings);

        let newest = *headings.front().ok_or(SensorError::NoNewData)?;

        let age = Instant::now().saturating_duration_since(newest.received);
        let max_age = millis(self.params.max_age_ms);
        if age > max_age {
            headings.clear();
            return Err(SensorError::Stale {
                age_ms: age.as_millis() as u64,
                max_age_ms: self.params.max_age_ms,
            });
        }

        let unwrapped: Vec<f64> = headings
            .iter()
            .take(window.max(1))
            .map(|h| newest.heading_rad + ang_dist(newest.heading_rad, h.heading_rad))
            .collect();

        median(&unwrapped)
            .map(wrap_pi)
            .ok_or(SensorError::NoNewData)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    fn buffer() -> CompassDataBuffer {
        CompassDataBuffer::new(CompassBufferParams::default(), LogContext::default())
    }

    #[test]
    fn test_median_filter() {
        let buf = buffer();
        assert_eq!(buf.filtered_heading(3), Err(SensorError::NoNewData));

        buf.push(0.10);
        assert!((buf.filtered_heading(3).unwrap() - 0.10).abs() < 1e-12);

        buf.push(0.50);
        buf.push(0.20);
        assert!((buf.filtered_heading(3).unwrap() - 0.20).abs() < 1e-12);

        // A single outlier is ignored
        buf.push(2.5);
        assert!((buf.filtered_heading(3).unwrap() - 0.50).abs() < 1e-12);
        assert_eq!(buf.len(), 3);

        // Window of one is just the newest reading
        assert!((buf.filtered_heading(1).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_median_across_pi() {
        let buf = buffer();

        buf.push(3.10);
        buf.push(-3.10);
        buf.push(3.12);

        // Naively the median would be 3.10, but -3.10 is the most anticlockwise reading
        let h = buf.filtered_heading(3).unwrap();
        assert!((h - 3.12).abs() < 1e-9, "heading was {}", h);

        let buf = buffer();
        buf.push(-3.12);
        buf.push(3.13);
        buf.push(-3.11);
        let h = buf.filtered_heading(3).unwrap();
        assert!((h - (-3.12)).abs() < 1e-9, "heading was {}", h);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let buf = buffer();
        assert!(!buf.push(4.0));
        assert!(!buf.push(f64::NAN));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_stale_flushes() {
        let buf = buffer();
        buf.push_at(0.3, Instant::now() - Duration::from_secs(2));

        assert!(matches!(
            buf.filtered_heading(3),
            Err(SensorError::Stale { max_age_ms: 800, .. })
        ));
        assert!(buf.is_empty());
        assert_eq!(buf.filtered_heading(3), Err(SensorError::NoNewData));
    }
}
