//! # Motion tasks
//!
//! A [`MotionTask`] is a request from a controller for the vehicle to move with a particular speed
//! and heading, tagged with the [`Priority`] of the requesting controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Process-unique identity of a submitted motion task.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(u64);

/// A speed and heading demand as delivered to the drive interface.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionCmd {
    /// Speed of the vehicle.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Heading (steering) demand. Positive turns left, negative turns right.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// An immutable, priority-tagged motion request.
///
/// Two tasks are only equal if they are the same submission, regardless of their speed and
/// heading. This allows a controller to revoke the task it submitted without clobbering a newer
/// task placed at the same priority by someone else.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct MotionTask {
    id: TaskId,
    priority: Priority,
    speed_ms: f64,
    heading_rad: f64,
    created: DateTime<Utc>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Priority levels of motion tasks.
///
/// Lower values take precedence, so `First` beats `Second` beats `Third`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Safety overrides, e.g. an emergency stop.
    First = 0,
    /// Navigation and other task-level controllers.
    Second = 1,
    /// Idle defaults.
    Third = 2,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Priority {
    /// All priorities, highest precedence first.
    pub const ALL: [Priority; 3] = [Priority::First, Priority::Second, Priority::Third];

    /// Number of priority levels.
    pub const COUNT: usize = Self::ALL.len();

    /// Index of this priority's slot, with `0` being the highest precedence.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns true if this priority takes precedence over `other`.
    pub fn is_higher_than(self, other: Priority) -> bool {
        self < other
    }
}

impl MotionCmd {
    /// The command which brings the vehicle to a stop.
    pub const STOP: MotionCmd = MotionCmd {
        speed_ms: MotionTask::STOP_SPEED,
        heading_rad: MotionTask::STOP_HEADING,
    };

    pub fn new(speed_ms: f64, heading_rad: f64) -> Self {
        Self { speed_ms, heading_rad }
    }

    pub fn is_stop(&self) -> bool {
        self.speed_ms == MotionTask::STOP_SPEED
    }
}

impl MotionTask {
    /// Speed of a stop task.
    pub const STOP_SPEED: f64 = 0.0;

    /// Heading of a stop task.
    pub const STOP_HEADING: f64 = 0.0;

    /// Create a new task with a fresh identity.
    pub fn new(priority: Priority, speed_ms: f64, heading_rad: f64) -> Self {
        Self {
            id: TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)),
            priority,
            speed_ms,
            heading_rad,
            created: Utc::now(),
        }
    }

    /// Create a task which stops the vehicle.
    pub fn stop(priority: Priority) -> Self {
        Self::new(priority, Self::STOP_SPEED, Self::STOP_HEADING)
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn speed_ms(&self) -> f64 {
        self.speed_ms
    }

    pub fn heading_rad(&self) -> f64 {
        self.heading_rad
    }

    /// Time the task was created, for diagnostics only.
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// The command this task demands of the drive.
    pub fn cmd(&self) -> MotionCmd {
        MotionCmd::new(self.speed_ms, self.heading_rad)
    }

    pub fn is_stop(&self) -> bool {
        self.speed_ms == Self::STOP_SPEED
    }

    pub fn is_higher_priority_than(&self, other: &MotionTask) -> bool {
        self.priority.is_higher_than(other.priority)
    }

    pub fn is_equal_priority_to(&self, other: &MotionTask) -> bool {
        self.priority == other.priority
    }
}

impl PartialEq for MotionTask {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MotionTask {}

impl fmt::Display for MotionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MotionTask#{} {:?} (speed {:.3} m/s, heading {:.3} rad)",
            self.id.0, self.priority, self.speed_ms, self.heading_rad
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Priority::First.is_higher_than(Priority::Second));
        assert!(Priority::Second.is_higher_than(Priority::Third));
        assert!(!Priority::Third.is_higher_than(Priority::First));
        assert!(!Priority::Second.is_higher_than(Priority::Second));

        for (i, p) in Priority::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn test_task_identity() {
        let a = MotionTask::new(Priority::Second, 1.0, 0.1);
        let b = MotionTask::new(Priority::Second, 1.0, 0.1);

        // Same contents, different submissions
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.is_equal_priority_to(&b));
        assert!(!a.is_higher_priority_than(&b));
    }

    #[test]
    fn test_stop_task() {
        let stop = MotionTask::stop(Priority::First);
        assert!(stop.is_stop());
        assert_eq!(stop.cmd(), MotionCmd::STOP);
        assert!(!MotionTask::new(Priority::First, 0.5, 0.0).is_stop());
    }

    #[test]
    fn test_priority_names() {
        let p: Priority = serde_json::from_str("\"Second\"").unwrap();
        assert_eq!(p, Priority::Second);
    }
}
