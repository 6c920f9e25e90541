//! Nearest neighbor queries over obstacle slices

use hapticfield_core::Point3d;

/// Brute force search over a borrowed slice of obstacles.
///
/// Obstacle sets are small and scanned every servo tick anyway, so a linear
/// scan without any index is both the simplest and the fastest option here.
/// None of the queries below allocate except [`radius_neighbors`].
///
/// [`radius_neighbors`]: BruteForceSearch::radius_neighbors
#[derive(Debug, Clone, Copy)]
pub struct BruteForceSearch<'a> {
    points: &'a [Point3d],
}

impl<'a> BruteForceSearch<'a> {
    pub fn new(points: &'a [Point3d]) -> Self {
        Self { points }
    }

    /// First obstacle, in storage order, strictly closer than `radius`
    pub fn first_within(&self, query: &Point3d, radius: f64) -> Option<(usize, f64)> {
        let radius_squared = radius * radius;
        self.points.iter().enumerate().find_map(|(idx, point)| {
            let distance_squared = (point - query).norm_squared();
            (distance_squared < radius_squared).then(|| (idx, distance_squared.sqrt()))
        })
    }

    /// Closest obstacle strictly closer than `radius`; ties keep the lower index
    pub fn nearest_within(&self, query: &Point3d, radius: f64) -> Option<(usize, f64)> {
        let radius_squared = radius * radius;
        let mut best: Option<(usize, f64)> = None;

        for (idx, point) in self.points.iter().enumerate() {
            let distance_squared = (point - query).norm_squared();
            if distance_squared >= radius_squared {
                continue;
            }
            match best {
                Some((_, best_squared)) if best_squared <= distance_squared => {}
                _ => best = Some((idx, distance_squared)),
            }
        }

        best.map(|(idx, distance_squared)| (idx, distance_squared.sqrt()))
    }

    /// All obstacles strictly closer than `radius`, in storage order
    pub fn radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)> {
        let radius_squared = radius * radius;
        self.points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let distance_squared = (point - query).norm_squared();

                if distance_squared < radius_squared {
                    Some((idx, distance_squared.sqrt()))
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_of_points() -> Vec<Point3d> {
        vec![
            Point3d::new(5.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(-1.0, 0.0, 0.0),
            Point3d::new(50.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_first_within_respects_storage_order() {
        let points = line_of_points();
        let search = BruteForceSearch::new(&points);
        let (idx, dist) = search.first_within(&Point3d::origin(), 10.0).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(dist, 5.0);
    }

    #[test]
    fn test_nearest_within_prefers_lower_index_on_tie() {
        let points = line_of_points();
        let search = BruteForceSearch::new(&points);
        let (idx, dist) = search.nearest_within(&Point3d::origin(), 10.0).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(dist, 1.0);
    }

    #[test]
    fn test_radius_is_exclusive() {
        let points = line_of_points();
        let search = BruteForceSearch::new(&points);
        assert!(search.first_within(&Point3d::origin(), 1.0).is_none());
        assert!(search.nearest_within(&Point3d::origin(), 1.0).is_none());

        let neighbors = search.radius_neighbors(&Point3d::origin(), 5.0);
        assert_eq!(neighbors, vec![(1, 1.0), (2, 1.0)]);
    }

    #[test]
    fn test_empty_slice() {
        let search = BruteForceSearch::new(&[]);
        assert!(search.first_within(&Point3d::origin(), 100.0).is_none());
        assert!(search.nearest_within(&Point3d::origin(), 100.0).is_none());
        assert!(search.radius_neighbors(&Point3d::origin(), 100.0).is_empty());
    }
}
