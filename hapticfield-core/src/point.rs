//! Point types and probe state

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// The most recently observed device state: where the probe is and the force
/// currently commanded on it.
///
/// The record is `Copy` and is always handed across threads whole, so a reader
/// holds either the old pair or the new pair, never a mix of both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeState {
    pub position: Point3d,
    pub force: Vector3d,
}

impl ProbeState {
    /// Create a probe state from a position and force
    pub fn new(position: Point3d, force: Vector3d) -> Self {
        Self { position, force }
    }

    /// Magnitude of the commanded force
    pub fn force_magnitude(&self) -> f64 {
        self.force.norm()
    }
}

impl Default for ProbeState {
    fn default() -> Self {
        Self {
            position: Point3d::origin(),
            force: Vector3d::zeros(),
        }
    }
}
