//! Obstacle set data structures

use crate::point::Point3d;
use crate::transform::SceneTransform;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// An ordered, fixed-length set of point obstacles.
///
/// The set is frozen at construction and exposes no mutation API; share it
/// with `Arc` between the servo loop and the visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSet {
    points: Box<[Point3d]>,
}

impl ObstacleSet {
    /// Create an empty obstacle set
    pub fn empty() -> Self {
        Self {
            points: Box::new([]),
        }
    }

    /// Create an obstacle set from a vector of points
    pub fn from_points(points: Vec<Point3d>) -> Self {
        Self {
            points: points.into_boxed_slice(),
        }
    }

    /// Get the number of obstacles
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get an iterator over the obstacles in storage order
    pub fn iter(&self) -> std::slice::Iter<'_, Point3d> {
        self.points.iter()
    }

    /// Borrow the obstacles as a slice
    pub fn as_slice(&self) -> &[Point3d] {
        &self.points
    }

    /// Get an obstacle by index
    pub fn get(&self, index: usize) -> Option<&Point3d> {
        self.points.get(index)
    }
}

impl Default for ObstacleSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<usize> for ObstacleSet {
    type Output = Point3d;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a ObstacleSet {
    type Item = &'a Point3d;
    type IntoIter = std::slice::Iter<'a, Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<Point3d> for ObstacleSet {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl AsRef<[Point3d]> for ObstacleSet {
    fn as_ref(&self) -> &[Point3d] {
        &self.points
    }
}

/// Growable staging buffer for an [`ObstacleSet`].
///
/// Obstacles are appended while the scene is streamed in, then the builder is
/// frozen. The final length is whatever was pushed, so no capacity needs to be
/// known up front.
#[derive(Debug, Clone, Default)]
pub struct ObstacleSetBuilder {
    points: Vec<Point3d>,
    transform: Option<SceneTransform>,
}

impl ObstacleSetBuilder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with reserved capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            transform: None,
        }
    }

    /// Apply `transform` to every point pushed from now on
    pub fn with_transform(mut self, transform: SceneTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Append an obstacle
    pub fn push(&mut self, point: Point3d) {
        let point = match &self.transform {
            Some(transform) => transform.transform_point(&point),
            None => point,
        };
        self.points.push(point);
    }

    /// Number of obstacles appended so far
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Freeze into an immutable obstacle set
    pub fn freeze(self) -> ObstacleSet {
        ObstacleSet::from_points(self.points)
    }
}

impl Extend<Point3d> for ObstacleSetBuilder {
    fn extend<I: IntoIterator<Item = Point3d>>(&mut self, iter: I) {
        for point in iter {
            self.push(point);
        }
    }
}
