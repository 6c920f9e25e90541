//! Cross-thread probe state snapshots

use crate::scheduler::{Scheduler, SchedulerError};
use hapticfield_core::ProbeState;

/// Consistent copy of the probe state taken on the servo thread
pub struct StateSnapshot;

impl StateSnapshot {
    /// Copy position and force from the same completed frame
    ///
    /// Blocks until the servo thread services the request between two ticks,
    /// or fails once the configured snapshot timeout elapses.
    pub fn take(scheduler: &Scheduler) -> Result<ProbeState, SchedulerError> {
        scheduler.schedule_synchronous(|device| ProbeState::new(device.read_position(), device.current_force()))
    }
}

/// Something that can hand out probe snapshots to a consumer thread
pub trait StateSource {
    fn snapshot(&self) -> Result<ProbeState, SchedulerError>;

    /// Whether the force rendering task is still running
    fn servo_active(&self) -> bool;
}
