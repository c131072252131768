//! # Motion Arbiter
//!
//! The arbiter is the single authority over the drive. Controllers (the navigator, manual
//! overrides, safety monitors) submit [`MotionTask`]s at their priority, and a periodic driver
//! thread sends the command of the highest precedence task to the drive every cycle, whether or
//! not it has changed. With no task in the table the driver sends a stop.
//!
//! A controller which stops without revoking its task leaves that task in the table, where it
//! keeps being sent until it is revoked or replaced.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod table;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use log::{debug, info, trace, warn};
use motion_if::{DriveInterface, MotionCmd, MotionTask};
use util::{
    logger::LogContext,
    sched::{lock_mutex, Periodic},
    time::millis,
};

pub use params::ArbiterParams;
pub use table::PriorityTable;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle to the motion arbiter.
///
/// Cloning the handle is cheap, all clones refer to the same arbiter.
#[derive(Clone)]
pub struct MotionArbiter {
    shared: Arc<Shared>,
}

struct Shared {
    params: ArbiterParams,
    log: LogContext,

    table: Mutex<PriorityTable>,

    /// Only written to by `send`, which is called by the driver thread or during shutdown.
    drive: Mutex<Box<dyn DriveInterface>>,

    last_cmd: Mutex<Option<MotionCmd>>,

    driver: Mutex<Option<Periodic>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    #[error("The arbiter's driver thread is already running")]
    AlreadyRunning,

    #[error("Could not spawn the driver thread: {0}")]
    SpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionArbiter {
    /// Create a new arbiter in front of the given drive.
    ///
    /// The driver thread is not started until [`MotionArbiter::start`] is called.
    pub fn new(params: ArbiterParams, mut drive: Box<dyn DriveInterface>, log: LogContext) -> Self {
        if params.power_on_motors {
            match drive.set_motor_power(true) {
                Ok(_) => info!(target: log.target(), "Motors powered on"),
                Err(e) => warn!(target: log.target(), "Could not power on the motors: {}", e),
            }
        }

        debug!(
            target: log.target(),
            "Arbiter created for {:?}, cycle period {} ms",
            params.motion_type,
            params.cycle_period_ms
        );

        Self {
            shared: Arc::new(Shared {
                params,
                log,
                table: Mutex::new(PriorityTable::new()),
                drive: Mutex::new(drive),
                last_cmd: Mutex::new(None),
                driver: Mutex::new(None),
            }),
        }
    }

    /// Start the periodic driver thread.
    pub fn start(&self) -> Result<(), ArbiterError> {
        let mut driver = lock_mutex(&self.shared.driver);

        if driver.is_some() {
            return Err(ArbiterError::AlreadyRunning);
        }

        // The thread only holds a weak reference, so dropping every handle stops it
        let weak = Arc::downgrade(&self.shared);

        let periodic = Periodic::spawn(
            "arbiter",
            millis(self.shared.params.cycle_period_ms),
            move || {
                if let Some(shared) = weak.upgrade() {
                    shared.tick();
                }
            },
        )
        .map_err(ArbiterError::SpawnError)?;

        *driver = Some(periodic);

        info!(target: self.shared.log.target(), "Arbiter driver started");

        Ok(())
    }

    /// Place `task` in its priority slot, replacing any task already there.
    ///
    /// Returns `true` if `task` is now the active task. The new command reaches the drive on the
    /// next cycle.
    pub fn submit_task(&self, task: MotionTask) -> bool {
        let active = lock_mutex(&self.shared.table).insert(task);

        trace!(
            target: self.shared.log.target(),
            "Submitted {} (active: {})",
            task,
            active
        );

        active
    }

    /// Remove `task` from its slot if, and only if, the slot still holds that same task.
    pub fn revoke_task(&self, task: &MotionTask) {
        let removed = lock_mutex(&self.shared.table).remove(task);

        if removed {
            trace!(target: self.shared.log.target(), "Revoked {}", task);
        } else {
            trace!(
                target: self.shared.log.target(),
                "Ignored revoke of {}, it is no longer in its slot",
                task
            );
        }
    }

    /// The task which will be sent on the next cycle, if any.
    pub fn active_task(&self) -> Option<MotionTask> {
        lock_mutex(&self.shared.table).active()
    }

    /// Run a single arbitration cycle, returning the command sent to the drive.
    pub fn tick(&self) -> MotionCmd {
        self.shared.tick()
    }

    /// The last command sent (or attempted) to the drive.
    pub fn last_cmd(&self) -> Option<MotionCmd> {
        *lock_mutex(&self.shared.last_cmd)
    }

    /// Stop the driver thread and send a final stop to the drive.
    pub fn shutdown(&self) {
        let driver = lock_mutex(&self.shared.driver).take();

        if let Some(driver) = driver {
            driver.stop();
        }

        self.shared.send(MotionCmd::STOP);

        info!(target: self.shared.log.target(), "Arbiter shut down");
    }
}

impl Shared {
    fn tick(&self) -> MotionCmd {
        let cmd = lock_mutex(&self.table)
            .active()
            .map(|t| t.cmd())
            .unwrap_or(MotionCmd::STOP);

        self.send(cmd);

        cmd
    }

    fn send(&self, cmd: MotionCmd) {
        *lock_mutex(&self.last_cmd) = Some(cmd);

        let mut drive = lock_mutex(&self.drive);

        if let Err(e) = self.params.motion_type.send(&mut **drive, &cmd) {
            warn!(
                target: self.log.target(),
                "Could not send ({:.3} m/s, {:.3} rad) to the drive: {}",
                cmd.speed_ms,
                cmd.heading_rad,
                e
            );
        }
    }
}
