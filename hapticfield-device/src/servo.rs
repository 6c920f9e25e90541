//! Per-tick force rendering

use crate::device::HapticDevice;
use crate::scheduler::{CallbackCode, ServoTask};
use hapticfield_algorithms::CoulombField;
use hapticfield_core::{ForceField, PolarityCell};
use std::sync::Arc;
use tracing::{error, warn};

/// Servo task that renders a Coulomb field on the device
///
/// Each tick opens a device frame, reads the probe position, writes the field
/// force for that position under the current polarity and closes the frame.
/// Device errors are drained afterwards: a scheduler error ends the task,
/// anything else is logged and the task keeps running.
pub struct CoulombServoTask {
    field: CoulombField,
    polarity: Arc<PolarityCell>,
    transient_errors: u64,
}

impl CoulombServoTask {
    pub fn new(field: CoulombField, polarity: Arc<PolarityCell>) -> Self {
        Self {
            field,
            polarity,
            transient_errors: 0,
        }
    }

    pub fn field(&self) -> &CoulombField {
        &self.field
    }

    /// Number of non-fatal device errors seen so far
    pub fn transient_errors(&self) -> u64 {
        self.transient_errors
    }
}

impl ServoTask for CoulombServoTask {
    fn run(&mut self, device: &mut dyn HapticDevice) -> CallbackCode {
        device.begin_frame();
        let position = device.read_position();
        let force = self.field.force_at(&position, self.polarity.load());
        device.write_force(force);
        device.end_frame();

        while let Some(err) = device.take_error() {
            if err.is_scheduler_error() {
                error!("Error during servo loop, stopping force rendering: {}", err);
                return CallbackCode::Done;
            }
            self.transient_errors += 1;
            warn!("Device error during servo loop: {}", err);
        }

        CallbackCode::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Capabilities, DeviceError, ErrorCode};
    use crate::simulated::{SimulatedDevice, Trajectory};
    use approx::assert_relative_eq;
    use hapticfield_algorithms::FieldParams;
    use hapticfield_core::{ObstacleSet, Point3d, Polarity, Vector3d};

    fn task(obstacles: Vec<Point3d>, polarity: Polarity) -> (CoulombServoTask, Arc<PolarityCell>) {
        let cell = Arc::new(PolarityCell::new(polarity));
        let field = CoulombField::new(Arc::new(ObstacleSet::from_points(obstacles)), FieldParams::default());
        (CoulombServoTask::new(field, Arc::clone(&cell)), cell)
    }

    fn device_at(position: Point3d) -> SimulatedDevice {
        let mut device = SimulatedDevice::new(Trajectory::Fixed(position)).with_max_force(100.0);
        device.enable(Capabilities::default()).unwrap();
        device
    }

    #[test]
    fn test_tick_writes_field_force() {
        let (mut task, _) = task(vec![Point3d::new(100.0, 0.0, 0.0)], Polarity::Positive);
        let mut device = device_at(Point3d::origin());

        assert_eq!(task.run(&mut device), CallbackCode::Continue);
        assert_relative_eq!(device.current_force(), Vector3d::new(0.0012, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_polarity_toggle_applies_on_next_tick() {
        let (mut task, cell) = task(vec![Point3d::new(10.0, 0.0, 0.0)], Polarity::Positive);
        let mut device = device_at(Point3d::origin());

        task.run(&mut device);
        assert_relative_eq!(device.current_force(), Vector3d::new(12.0, 0.0, 0.0), epsilon = 1e-12);

        cell.toggle();
        task.run(&mut device);
        assert_relative_eq!(device.current_force(), Vector3d::new(-12.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_transient_error_keeps_running() {
        let (mut task, _) = task(vec![], Polarity::Positive);
        let mut device = device_at(Point3d::origin());
        device
            .control()
            .inject_error(DeviceError::new(ErrorCode::ExceededMaxVelocity, 3, "Velocity limit"));

        assert_eq!(task.run(&mut device), CallbackCode::Continue);
        assert_eq!(task.transient_errors(), 1);
        assert_eq!(task.run(&mut device), CallbackCode::Continue);
    }

    #[test]
    fn test_scheduler_error_ends_task() {
        let (mut task, _) = task(vec![], Polarity::Positive);
        let mut device = device_at(Point3d::origin());
        device
            .control()
            .inject_error(DeviceError::new(ErrorCode::CommError, 257, "Lost connection"));

        assert_eq!(task.run(&mut device), CallbackCode::Done);
    }
}
