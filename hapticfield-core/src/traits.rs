//! Core traits for hapticfield

use crate::{obstacle_set::ObstacleSet, point::*, polarity::Polarity};

/// A force field that can be sampled at a probe position
pub trait ForceField: Send + Sync {
    /// Force acting on a probe at `probe` under the given polarity
    fn force_at(&self, probe: &Point3d, polarity: Polarity) -> Vector3d;
}

/// Trait for objects with a spatial extent
pub trait Bounded {
    /// Get the axis-aligned bounding box of the object
    fn bounding_box(&self) -> (Point3d, Point3d);

    /// Get the center point of the object
    fn center(&self) -> Point3d {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

impl Bounded for ObstacleSet {
    fn bounding_box(&self) -> (Point3d, Point3d) {
        let mut points = self.iter();
        let first = match points.next() {
            Some(point) => *point,
            None => return (Point3d::origin(), Point3d::origin()),
        };

        let mut min = first;
        let mut max = first;
        for point in points {
            min = min.inf(point);
            max = max.sup(point);
        }

        (min, max)
    }
}

impl Bounded for (Point3d, Point3d) {
    fn bounding_box(&self) -> (Point3d, Point3d) {
        (self.0.inf(&self.1), self.0.sup(&self.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obstacle_bounding_box() {
        let set = ObstacleSet::from_points(vec![
            Point3d::new(-1.0, 2.0, 0.0),
            Point3d::new(3.0, -4.0, 1.0),
            Point3d::new(0.0, 0.0, -5.0),
        ]);
        let (min, max) = set.bounding_box();
        assert_eq!(min, Point3d::new(-1.0, -4.0, -5.0));
        assert_eq!(max, Point3d::new(3.0, 2.0, 1.0));
        assert_eq!(set.center(), Point3d::new(1.0, -1.0, -2.0));
    }

    #[test]
    fn test_empty_bounding_box_is_origin() {
        let (min, max) = ObstacleSet::empty().bounding_box();
        assert_eq!(min, Point3d::origin());
        assert_eq!(max, Point3d::origin());
    }
}
