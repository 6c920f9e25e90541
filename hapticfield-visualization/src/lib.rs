//! Visualization consumer for hapticfield
//!
//! This crate runs the slow side of the application:
//! - Frame loop sampling the servo state through snapshots
//! - Display model handed to a pluggable frame sink
//! - Viewport framing the device workspace
//! - User commands (polarity toggle, quit)

pub mod command;
pub mod display;
pub mod frame_loop;
pub mod viewport;

pub use command::*;
pub use display::*;
pub use frame_loop::*;
pub use viewport::*;
