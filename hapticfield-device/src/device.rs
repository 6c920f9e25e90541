//! Device abstraction
//!
//! A [`HapticDevice`] is a probe with a position sensor and a force actuator.
//! All frame operations happen on the servo thread; positions and forces are
//! latched per frame, so reads outside a frame return the values of the most
//! recent frame.

use hapticfield_core::{Point3d, Vector3d};
use thiserror::Error;

/// Device features requested when the device is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Render commanded forces on the actuator
    pub force_output: bool,
    /// Scale forces above the device maximum down instead of faulting
    pub max_force_clamping: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            force_output: true,
            max_force_clamping: true,
        }
    }
}

/// Error categories reported by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CommError,
    CommConfigError,
    TimerError,
    InvalidPriority,
    SchedulerFull,
    ExceededMaxForce,
    ExceededMaxVelocity,
    IllegalFrameCall,
    DeviceFault,
}

impl ErrorCode {
    /// Errors after which the servo loop cannot keep running
    pub fn is_scheduler_error(self) -> bool {
        matches!(
            self,
            ErrorCode::CommError
                | ErrorCode::CommConfigError
                | ErrorCode::TimerError
                | ErrorCode::InvalidPriority
                | ErrorCode::SchedulerFull
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCode::CommError => "communication error",
            ErrorCode::CommConfigError => "communication configuration error",
            ErrorCode::TimerError => "servo timer error",
            ErrorCode::InvalidPriority => "invalid scheduler priority",
            ErrorCode::SchedulerFull => "scheduler full",
            ErrorCode::ExceededMaxForce => "exceeded maximum force",
            ErrorCode::ExceededMaxVelocity => "exceeded maximum velocity",
            ErrorCode::IllegalFrameCall => "call outside of a device frame",
            ErrorCode::DeviceFault => "device fault",
        };
        f.write_str(name)
    }
}

/// Error reported by a device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{context}: {code} (internal code {internal})")]
pub struct DeviceError {
    pub code: ErrorCode,
    /// Vendor specific error number
    pub internal: i32,
    pub context: String,
}

impl DeviceError {
    pub fn new(code: ErrorCode, internal: i32, context: impl Into<String>) -> Self {
        Self {
            code,
            internal,
            context: context.into(),
        }
    }

    pub fn is_scheduler_error(&self) -> bool {
        self.code.is_scheduler_error()
    }
}

impl From<DeviceError> for hapticfield_core::Error {
    fn from(e: DeviceError) -> Self {
        hapticfield_core::Error::Device(e.to_string())
    }
}

/// A force feedback device driven by the servo thread
pub trait HapticDevice: Send {
    /// Human readable model name
    fn model(&self) -> &str;

    /// Enable the device with the requested capabilities
    fn enable(&mut self, capabilities: Capabilities) -> Result<(), DeviceError>;

    /// Stop rendering forces and release the device
    fn disable(&mut self);

    fn is_enabled(&self) -> bool;

    /// Open a frame and latch the current probe position
    fn begin_frame(&mut self);

    /// Close the frame and commit the commanded force
    fn end_frame(&mut self);

    /// Probe position latched by the most recent frame
    fn read_position(&self) -> Point3d;

    /// Force commanded in the most recent frame
    fn current_force(&self) -> Vector3d;

    /// Command a force for the open frame
    fn write_force(&mut self, force: Vector3d);

    /// Pop the oldest pending error, if any
    fn take_error(&mut self) -> Option<DeviceError>;

    /// Block until the next servo tick is due
    fn wait_for_servo_tick(&mut self);

    /// Axis aligned bounds of the reachable workspace
    fn workspace_bounds(&self) -> (Point3d, Point3d);
}

impl<D: HapticDevice + ?Sized> HapticDevice for Box<D> {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn enable(&mut self, capabilities: Capabilities) -> Result<(), DeviceError> {
        (**self).enable(capabilities)
    }

    fn disable(&mut self) {
        (**self).disable()
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn begin_frame(&mut self) {
        (**self).begin_frame()
    }

    fn end_frame(&mut self) {
        (**self).end_frame()
    }

    fn read_position(&self) -> Point3d {
        (**self).read_position()
    }

    fn current_force(&self) -> Vector3d {
        (**self).current_force()
    }

    fn write_force(&mut self, force: Vector3d) {
        (**self).write_force(force)
    }

    fn take_error(&mut self) -> Option<DeviceError> {
        (**self).take_error()
    }

    fn wait_for_servo_tick(&mut self) {
        (**self).wait_for_servo_tick()
    }

    fn workspace_bounds(&self) -> (Point3d, Point3d) {
        (**self).workspace_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_error_classification() {
        for code in [
            ErrorCode::CommError,
            ErrorCode::CommConfigError,
            ErrorCode::TimerError,
            ErrorCode::InvalidPriority,
            ErrorCode::SchedulerFull,
        ] {
            assert!(code.is_scheduler_error(), "{:?}", code);
        }
        for code in [
            ErrorCode::ExceededMaxForce,
            ErrorCode::ExceededMaxVelocity,
            ErrorCode::IllegalFrameCall,
            ErrorCode::DeviceFault,
        ] {
            assert!(!code.is_scheduler_error(), "{:?}", code);
        }
    }

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::new(ErrorCode::CommError, 257, "Error during servo loop");
        assert_eq!(
            err.to_string(),
            "Error during servo loop: communication error (internal code 257)"
        );
        assert!(err.is_scheduler_error());

        let core: hapticfield_core::Error = err.into();
        assert!(matches!(core, hapticfield_core::Error::Device(_)));
    }

    #[test]
    fn test_default_capabilities() {
        let caps = Capabilities::default();
        assert!(caps.force_output);
        assert!(caps.max_force_clamping);
    }
}
