//! Haptic device access and the servo scheduler
//!
//! The device is owned by a dedicated servo thread that runs registered
//! tasks once per device tick. Other threads interact with it only through
//! the [`Scheduler`]: asynchronous tasks that run every tick, and synchronous
//! calls that run once between ticks and hand their result back.

pub mod device;
pub mod simulated;
pub mod scheduler;
pub mod servo;
pub mod snapshot;
pub mod session;

pub use device::*;
pub use simulated::{SimulatedDevice, SimulatedDeviceControl, Trajectory};
pub use scheduler::*;
pub use servo::CoulombServoTask;
pub use snapshot::{StateSnapshot, StateSource};
pub use session::HapticSession;
