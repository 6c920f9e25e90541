//! # hapticfield Algorithms
//!
//! Force field kernels evaluated by the servo loop.
//!
//! The Coulomb kernel maps a probe position and a set of point obstacles to a
//! force vector. It is a pure function: no shared state, no I/O, no allocation.

pub mod force_field;
pub mod nearest_neighbor;

// Re-export commonly used items
pub use force_field::*;
pub use nearest_neighbor::*;
