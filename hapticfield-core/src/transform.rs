//! Scene coordinate transforms
//!
//! Scene files are authored in a y-up model space in decimetres; the device
//! workspace is z-forward in millimetres with its origin above the desk. A
//! [`SceneTransform`] maps one onto the other as a single homogeneous matrix.

use nalgebra::{Matrix4, Point3, Vector3};

/// Default scale from scene units to device units
pub const DEFAULT_COORDINATE_SCALE: f64 = 10.0;

/// Default offset applied to the device y axis after scaling
pub const DEFAULT_VERTICAL_OFFSET: f64 = -35.0;

/// An affine transformation applied to scene points on load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    pub matrix: Matrix4<f64>,
}

impl SceneTransform {
    /// Create a translation transformation
    pub fn translation(translation: Vector3<f64>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a uniform scaling transformation
    pub fn uniform_scaling(scale: f64) -> Self {
        Self {
            matrix: Matrix4::new_scaling(scale),
        }
    }

    /// Swap the y and z axes
    pub fn swap_yz() -> Self {
        Self {
            matrix: Matrix4::new(
                1.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
        }
    }

    /// Map a scene point `(x, y, z)` to `(s·x, s·z + offset, s·y)`
    pub fn scene(scale: f64, vertical_offset: f64) -> Self {
        Self::translation(Vector3::new(0.0, vertical_offset, 0.0))
            * Self::swap_yz()
            * Self::uniform_scaling(scale)
    }

    /// The transform used for OBJ scenes: scale 10, vertical offset -35
    pub fn obj_scene() -> Self {
        Self::scene(DEFAULT_COORDINATE_SCALE, DEFAULT_VERTICAL_OFFSET)
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Compose this transformation with another (`other` is applied first)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }
}

impl std::ops::Mul for SceneTransform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}
