//! Core data structures for hapticfield
//!
//! This crate provides the fundamental types shared by the servo loop and the
//! visualization consumer: vectors and probe state, the immutable obstacle set,
//! the polarity cell, the scene coordinate transform and the configuration.

pub mod point;
pub mod obstacle_set;
pub mod polarity;
pub mod traits;
pub mod transform;
pub mod config;
pub mod error;

pub use point::*;
pub use obstacle_set::*;
pub use polarity::*;
pub use traits::*;
pub use transform::*;
pub use config::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
