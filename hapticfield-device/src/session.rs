//! Device session lifecycle

use crate::device::{Capabilities, HapticDevice};
use crate::scheduler::{
    start_device, Scheduler, SchedulerError, SchedulerPriority, ServoStats, ServoTask, TaskHandle, WaitMode,
};
use crate::snapshot::{StateSnapshot, StateSource};
use hapticfield_core::{Point3d, ProbeState, Result, ServoConfig};
use tracing::{info, warn};

/// An enabled device with its servo scheduler and force rendering task
///
/// Dropping the session unschedules the task, stops the servo thread and
/// disables the device.
pub struct HapticSession {
    scheduler: Scheduler,
    servo_task: Option<TaskHandle>,
    model: String,
    workspace: (Point3d, Point3d),
}

impl HapticSession {
    /// Enable `device` and start its servo thread
    pub fn open<D>(device: D, capabilities: Capabilities, config: &ServoConfig) -> Result<Self>
    where
        D: HapticDevice + 'static,
    {
        let model = device.model().to_string();
        let workspace = device.workspace_bounds();
        let scheduler = start_device(device, capabilities, config)?;
        info!("Opened haptic session on {}", model);

        Ok(Self {
            scheduler,
            servo_task: None,
            model,
            workspace,
        })
    }

    /// Install the force rendering task, replacing any previous one
    pub fn start_servo_task<T>(&mut self, task: T) -> Result<()>
    where
        T: ServoTask + 'static,
    {
        if let Some(previous) = self.servo_task.take() {
            self.scheduler.unschedule(&previous);
        }
        let handle = self.scheduler.schedule_asynchronous(task, SchedulerPriority::MAX)?;
        self.servo_task = Some(handle);
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn workspace_bounds(&self) -> (Point3d, Point3d) {
        self.workspace
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> ServoStats {
        self.scheduler.stats()
    }

    /// Stop force rendering and release the device
    pub fn close(mut self) -> std::result::Result<(), SchedulerError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> std::result::Result<(), SchedulerError> {
        if let Some(handle) = self.servo_task.take() {
            self.scheduler.unschedule(&handle);
        }
        self.scheduler.stop()
    }
}

impl StateSource for HapticSession {
    fn snapshot(&self) -> std::result::Result<ProbeState, SchedulerError> {
        StateSnapshot::take(&self.scheduler)
    }

    fn servo_active(&self) -> bool {
        match &self.servo_task {
            Some(handle) => self.scheduler.wait_for_completion(handle, WaitMode::CheckStatus),
            None => false,
        }
    }
}

impl Drop for HapticSession {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Error while closing haptic session on {}: {}", self.model, e);
        }
    }
}
