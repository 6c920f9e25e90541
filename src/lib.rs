//! # hapticfield
//!
//! Real-time Coulomb force fields rendered on a haptic device.
//!
//! This is the umbrella crate that provides convenient access to all hapticfield
//! functionality. You can use this crate to get everything in one place, or use
//! individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Probe state, obstacle set, polarity, scene transform, configuration
//! - **Algorithms**: The Coulomb force field kernel
//! - **I/O**: Scene file loading
//! - **Device**: Device abstraction, simulated device and servo scheduler
//! - **Visualization**: Frame loop, display model and viewport
//!
//! ## Quick Start
//!
//! ```rust
//! use hapticfield::prelude::*;
//! use std::sync::Arc;
//!
//! let obstacles = Arc::new(ObstacleSet::from_points(vec![Point3d::origin()]));
//! let field = CoulombField::new(obstacles, FieldParams::default());
//!
//! let force = field.force_at(&Point3d::new(100.0, 0.0, 0.0), Polarity::Positive);
//! assert!((force.x + 0.0012).abs() < 1e-12);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core, algorithms, io and device
//! - `algorithms`: Force field kernel
//! - `io`: Scene loading
//! - `device`: Device, scheduler and session
//! - `visualization`: Frame loop and display model
//! - `all`: Enables all features

// Re-export core functionality
pub use hapticfield_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use hapticfield_algorithms as algorithms;

#[cfg(feature = "io")]
pub use hapticfield_io as io;

#[cfg(feature = "device")]
pub use hapticfield_device as device;

#[cfg(feature = "visualization")]
pub use hapticfield_visualization as visualization;

/// Convenient imports for common use cases
pub mod prelude {
    pub use hapticfield_core::*;

    #[cfg(feature = "algorithms")]
    pub use hapticfield_algorithms::{compute_force, CoulombField, FieldContext, FieldError, FieldParams};

    #[cfg(feature = "io")]
    pub use hapticfield_io::{load_scene, read_obstacles, ObstacleReader, SceneError, SceneReader};

    #[cfg(feature = "device")]
    pub use hapticfield_device::{
        Capabilities, CoulombServoTask, DeviceError, ErrorCode, HapticDevice, HapticSession, Scheduler,
        SchedulerError, SimulatedDevice, StateSnapshot, StateSource, Trajectory,
    };

    #[cfg(feature = "visualization")]
    pub use hapticfield_visualization::{
        Command, CommandSource, DisplayFrame, FrameLoop, FrameLoopExit, FrameSink, LogSink, Viewport,
    };
}
