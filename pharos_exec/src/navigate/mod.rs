//! # Navigator
//!
//! Closed loop GPS and compass navigation. Each cycle the navigator reads the latest fix and
//! filtered heading, works out a speed and heading demand from the control law in [`ctrl`], and
//! submits it to the [`MotionArbiter`] at its configured priority.
//!
//! Missing or stale sensor data stops the robot for that cycle and is retried on the next one. The
//! only fatal condition is a fix implausibly far from the destination.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod ctrl;
mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use motion_if::{HeadingSource, Location, LocationSource, MotionTask};
use util::{
    archive::Archiver, logger::LogContext, sched::lock_mutex, sched::CancelToken,
    session::get_elapsed_seconds, time::millis,
};

use crate::arbiter::MotionArbiter;
use ctrl::TargetDirection;
use state::CycleStep;

pub use params::{ApproachBand, DampingBand, NavParams};
pub use state::{NavCycleRecord, NavOutcome, NavState};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Drives the robot to a destination.
///
/// All methods take `&self`, so a navigator shared in an `Arc` can be stopped from another thread
/// while `go` is running.
pub struct Navigator {
    params: NavParams,
    log: LogContext,

    arbiter: MotionArbiter,
    gps: Arc<dyn LocationSource>,
    compass: Arc<dyn HeadingSource>,

    token: CancelToken,
    bookkeeping: Mutex<Bookkeeping>,
    archive: Option<Mutex<Archiver>>,
}

#[derive(Debug)]
struct Bookkeeping {
    state: NavState,

    /// The last task this navigator submitted.
    prev_task: Option<MotionTask>,

    /// Distance to the destination at the last cycle which had sensor data.
    ///
    /// Units: meters
    distance_m: Option<f64>,

    /// Speed of the last moving task submitted.
    ///
    /// Units: meters/second
    speed_ms: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Navigator {
    pub fn new(
        params: NavParams,
        arbiter: MotionArbiter,
        gps: Arc<dyn LocationSource>,
        compass: Arc<dyn HeadingSource>,
        log: LogContext,
    ) -> Self {
        Self {
            params,
            log,
            arbiter,
            gps,
            compass,
            token: CancelToken::new(),
            bookkeeping: Mutex::new(Bookkeeping {
                state: NavState::Idle,
                prev_task: None,
                distance_m: None,
                speed_ms: 0.0,
            }),
            archive: None,
        }
    }

    /// Archive a [`NavCycleRecord`] for every control cycle.
    pub fn with_archive(mut self, archiver: Archiver) -> Self {
        self.archive = Some(Mutex::new(archiver));
        self
    }

    /// Drive to `dest` at up to `velocity_ms`, blocking until the robot arrives, the navigation
    /// is aborted, or [`Navigator::stop`] is called.
    ///
    /// Returns `true` only if the robot arrived.
    pub fn go(&self, dest: Location, velocity_ms: f64) -> bool {
        self.navigate(dest, velocity_ms).is_arrived()
    }

    /// As [`Navigator::go`] but returning how the navigation ended.
    pub fn navigate(&self, dest: Location, velocity_ms: f64) -> NavOutcome {
        self.clear_stop();
        self.navigate_unless_stopped(dest, velocity_ms)
    }

    /// As [`Navigator::navigate`] but a [`Navigator::stop`] issued since the last
    /// [`Navigator::clear_stop`] still applies, ending the navigation before it starts.
    pub fn navigate_unless_stopped(&self, dest: Location, velocity_ms: f64) -> NavOutcome {
        if !dest.is_valid() {
            error!(target: self.log.target(), "Cannot navigate to invalid destination {}", dest);
            self.stop_robot();
            lock_mutex(&self.bookkeeping).state = NavState::Aborted;
            return NavOutcome::Aborted(f64::NAN);
        }

        {
            let mut book = lock_mutex(&self.bookkeeping);
            book.state = NavState::Approaching;
            book.distance_m = None;
        }

        info!(
            target: self.log.target(),
            "Navigating to {} at {:.2} m/s",
            dest,
            velocity_ms
        );

        let period = millis(self.params.cycle_period_ms);

        let outcome = loop {
            if self.token.is_cancelled() {
                break NavOutcome::Cancelled;
            }

            match self.cycle(&dest, velocity_ms) {
                CycleStep::Continue => (),
                CycleStep::Arrived => break NavOutcome::Arrived,
                CycleStep::Aborted(d) => break NavOutcome::Aborted(d),
            }

            if self.token.wait_timeout(period) {
                break NavOutcome::Cancelled;
            }
        };

        // Whatever the reason for leaving the loop the robot is left stopped
        self.stop_robot();

        lock_mutex(&self.bookkeeping).state = match outcome {
            NavOutcome::Arrived => NavState::Arrived,
            NavOutcome::Aborted(_) => NavState::Aborted,
            NavOutcome::Cancelled => NavState::Idle,
        };

        info!(target: self.log.target(), "Navigation to {} ended: {:?}", dest, outcome);

        outcome
    }

    /// Cancel a running [`Navigator::go`], which returns within one cycle period.
    ///
    /// The stop stays in force for [`Navigator::pause`] and
    /// [`Navigator::navigate_unless_stopped`] until [`Navigator::clear_stop`] is called.
    pub fn stop(&self) {
        debug!(target: self.log.target(), "Stop requested");
        self.token.cancel();
    }

    /// Forget any earlier [`Navigator::stop`].
    pub fn clear_stop(&self) {
        self.token.reset();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for `duration`, returning early with `true` if the navigator is stopped.
    pub fn pause(&self, duration: Duration) -> bool {
        self.token.wait_timeout(duration)
    }

    pub fn state(&self) -> NavState {
        lock_mutex(&self.bookkeeping).state
    }

    /// Distance to the destination at the last cycle with sensor data.
    ///
    /// Units: meters
    pub fn last_distance_m(&self) -> Option<f64> {
        lock_mutex(&self.bookkeeping).distance_m
    }

    /// Predict whether the robot will arrive within `ahead`, assuming it moves at the speed of the
    /// last moving task submitted. Stops don't count, so the prediction still holds after
    /// arriving. Returns `false` if the robot has never been commanded to move.
    pub fn are_we_there_yet(&self, ahead: Duration) -> bool {
        let book = lock_mutex(&self.bookkeeping);

        match book.distance_m {
            Some(distance_m) if book.speed_ms > 0.0 => {
                distance_m / book.speed_ms * 1000.0 < ahead.as_millis() as f64
            }
            _ => false,
        }
    }

    /// Revoke the navigator's last task, handing control back to lower priority controllers.
    pub fn release(&self) {
        if let Some(task) = lock_mutex(&self.bookkeeping).prev_task.take() {
            self.arbiter.revoke_task(&task);
            debug!(target: self.log.target(), "Released {}", task);
        }
    }

    /// Submit a stop at the navigator's priority.
    pub fn stop_robot(&self) {
        let mut book = lock_mutex(&self.bookkeeping);
        let stop = MotionTask::stop(self.params.priority);
        self.replace_task(&mut book, stop);
    }

    /// Run one control cycle: read the sensors, then act on them.
    fn cycle(&self, dest: &Location, velocity_ms: f64) -> CycleStep {
        let curr = match self.gps.current_location() {
            Ok(loc) if loc.is_valid() => loc,
            Ok(loc) => {
                warn!(target: self.log.target(), "Invalid GPS fix {}, stopping", loc);
                self.stop_robot();
                return CycleStep::Continue;
            }
            Err(e) => {
                warn!(target: self.log.target(), "No GPS fix ({}), stopping", e);
                self.stop_robot();
                return CycleStep::Continue;
            }
        };

        let heading = match self
            .compass
            .filtered_heading(self.params.compass_filter_window)
        {
            Ok(h) => h,
            Err(e) => {
                warn!(target: self.log.target(), "No compass heading ({}), stopping", e);
                self.stop_robot();
                return CycleStep::Continue;
            }
        };

        self.do_next_motion_task(&curr, heading, dest, velocity_ms)
    }

    /// Compute and submit the motion task for the robot at `curr` facing `heading_rad`.
    pub(crate) fn do_next_motion_task(
        &self,
        curr: &Location,
        heading_rad: f64,
        dest: &Location,
        velocity_ms: f64,
    ) -> CycleStep {
        let target = ctrl::locate_target(curr, heading_rad, dest);

        let mut book = lock_mutex(&self.bookkeeping);
        book.distance_m = Some(target.distance_m);

        let (task, step) = if target.distance_m < self.params.arrival_radius_m {
            info!(
                target: self.log.target(),
                "Arrived, {:.2} m from the destination",
                target.distance_m
            );

            if let Some(prev) = book.prev_task.take() {
                self.arbiter.revoke_task(&prev);
            }

            (MotionTask::stop(self.params.priority), CycleStep::Arrived)
        } else if target.distance_m > self.params.sanity_ceiling_m {
            error!(
                target: self.log.target(),
                "Destination is {:.1} m away (more than {:.1} m), the fix {} is probably corrupt. \
                 Aborting.",
                target.distance_m,
                self.params.sanity_ceiling_m,
                curr
            );

            (
                MotionTask::stop(self.params.priority),
                CycleStep::Aborted(target.distance_m),
            )
        } else {
            let speed_ms = ctrl::calc_controlled_velocity(
                &self.params,
                target.distance_m,
                velocity_ms,
                target.heading_error_rad,
            );
            let heading_cmd_rad =
                ctrl::calc_controlled_heading(&self.params, speed_ms, target.heading_error_rad);

            debug!(
                target: self.log.target(),
                "{:.2} m to go, heading error {:.3} rad: speed {:.2} m/s, heading {:.3} rad",
                target.distance_m,
                target.heading_error_rad,
                speed_ms,
                heading_cmd_rad
            );

            (
                MotionTask::new(self.params.priority, speed_ms, heading_cmd_rad),
                CycleStep::Continue,
            )
        };

        self.replace_task(&mut book, task);
        if !task.is_stop() {
            book.speed_ms = task.speed_ms();
        }
        drop(book);

        self.archive_cycle(curr, heading_rad, &target, &task);

        step
    }

    /// Submit `task` and revoke the previously submitted one if it was a different task.
    fn replace_task(&self, book: &mut Bookkeeping, task: MotionTask) {
        self.arbiter.submit_task(task);

        if let Some(prev) = book.prev_task.replace(task) {
            if prev != task {
                self.arbiter.revoke_task(&prev);
            }
        }
    }

    fn archive_cycle(
        &self,
        curr: &Location,
        heading_rad: f64,
        target: &TargetDirection,
        task: &MotionTask,
    ) {
        let archive = match &self.archive {
            Some(a) => a,
            None => return,
        };

        let record = NavCycleRecord {
            time_s: get_elapsed_seconds(),
            latitude_deg: curr.latitude_deg,
            longitude_deg: curr.longitude_deg,
            heading_rad,
            distance_m: target.distance_m,
            heading_error_rad: target.heading_error_rad,
            speed_cmd_ms: task.speed_ms(),
            heading_cmd_rad: task.heading_rad(),
        };

        if let Err(e) = lock_mutex(archive).serialise(&record) {
            warn!(target: self.log.target(), "Could not archive the navigation cycle: {}", e);
        }
    }
}
