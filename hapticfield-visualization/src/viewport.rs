//! Camera framing for the device workspace

use hapticfield_core::{Point3d, Vector3d};
use nalgebra::{Matrix4, Perspective3, Point3};

/// A perspective camera looking at the haptic workspace
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub eye: Point3d,
    pub target: Point3d,
    pub up: Vector3d,
    /// Vertical field of view in radians
    pub fov: f64,
    pub aspect_ratio: f64,
    pub near: f64,
    pub far: f64,
}

impl Viewport {
    pub fn new(
        eye: Point3d,
        target: Point3d,
        up: Vector3d,
        fov: f64,
        aspect_ratio: f64,
        near: f64,
        far: f64,
    ) -> Self {
        Self {
            eye,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Camera on the +z axis that keeps the whole workspace box in view
    ///
    /// The box is enclosed in its bounding sphere and the camera is pulled
    /// back until the sphere touches the narrower of the two view angles.
    pub fn fit_workspace(min: &Point3d, max: &Point3d, aspect_ratio: f64) -> Self {
        let fov = std::f64::consts::FRAC_PI_4;
        let target = nalgebra::center(min, max);
        let radius = ((max - min).norm() * 0.5).max(f64::EPSILON);

        let vertical_half = fov * 0.5;
        let horizontal_half = (vertical_half.tan() * aspect_ratio).atan();
        let distance = radius / vertical_half.min(horizontal_half).sin();

        Self::new(
            target + Vector3d::z() * distance,
            target,
            Vector3d::y(),
            fov,
            aspect_ratio,
            distance - radius,
            distance + radius,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.eye, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far).into_inner()
    }

    pub fn view_projection(&self) -> Matrix4<f64> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Normalized device coordinates of a world point
    pub fn project(&self, point: &Point3d) -> Point3<f64> {
        let view = self.view_matrix().transform_point(point);
        Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far).project_point(&view)
    }

    /// Whether a world point lies inside the view frustum
    pub fn contains(&self, point: &Point3d) -> bool {
        let ndc = self.project(point);
        let inside = |v: f64| (-1.0 - 1e-9..=1.0 + 1e-9).contains(&v);
        inside(ndc.x) && inside(ndc.y) && inside(ndc.z)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(
            Point3d::new(0.0, 0.0, 5.0),
            Point3d::origin(),
            Vector3d::y(),
            std::f64::consts::FRAC_PI_4,
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }
}
