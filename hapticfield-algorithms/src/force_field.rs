//! Coulomb-style force field over point obstacles
//!
//! Each obstacle away from the probe contributes an inverse-square term
//! `-scale * unit(probe - o) / dist²`. As soon as the probe overlaps an
//! obstacle (closer than twice the collision radius) the superposition is
//! abandoned and the probe is pulled with a constant-magnitude contact force
//! `-scale * unit(probe - o)` instead. Both paths are multiplied by the field
//! polarity.

use crate::nearest_neighbor::BruteForceSearch;
use hapticfield_core::{
    ContactPolicy, FieldConfig, ForceField, ObstacleSet, Point3d, Polarity, Vector3d,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building field parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Invalid field parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

impl From<FieldError> for hapticfield_core::Error {
    fn from(e: FieldError) -> Self {
        hapticfield_core::Error::InvalidData(e.to_string())
    }
}

/// Validated constants of the Coulomb kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    scale: f64,
    collision_radius: f64,
    contact_policy: ContactPolicy,
}

impl FieldParams {
    /// Create parameters; the scale must be finite and the radius positive
    pub fn new(scale: f64, collision_radius: f64, contact_policy: ContactPolicy) -> Result<Self, FieldError> {
        if !scale.is_finite() {
            return Err(FieldError::InvalidParameter { name: "scale", value: scale });
        }
        // A positive radius keeps dist = 0 inside the overlap branch
        if !(collision_radius.is_finite() && collision_radius > 0.0) {
            return Err(FieldError::InvalidParameter {
                name: "collision_radius",
                value: collision_radius,
            });
        }
        Ok(Self {
            scale,
            collision_radius,
            contact_policy,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn collision_radius(&self) -> f64 {
        self.collision_radius
    }

    /// Distance below which an obstacle overlaps the probe
    pub fn contact_distance(&self) -> f64 {
        2.0 * self.collision_radius
    }

    pub fn contact_policy(&self) -> ContactPolicy {
        self.contact_policy
    }

    pub fn with_contact_policy(mut self, contact_policy: ContactPolicy) -> Self {
        self.contact_policy = contact_policy;
        self
    }
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            scale: 12.0,
            collision_radius: 15.0,
            contact_policy: ContactPolicy::FirstFound,
        }
    }
}

impl TryFrom<&FieldConfig> for FieldParams {
    type Error = FieldError;

    fn try_from(config: &FieldConfig) -> Result<Self, Self::Error> {
        Self::new(config.scale, config.collision_radius, config.contact_policy)
    }
}

/// Everything the kernel needs for one evaluation, captured once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldContext {
    pub params: FieldParams,
    pub polarity: Polarity,
}

impl FieldContext {
    pub fn new(params: FieldParams, polarity: Polarity) -> Self {
        Self { params, polarity }
    }
}

/// Force on a probe at `probe` from `obstacles`.
///
/// Returns the zero vector for an empty obstacle set, and for a probe exactly
/// on top of the contacting obstacle, where no pull direction exists.
pub fn compute_force(probe: &Point3d, obstacles: &[Point3d], ctx: &FieldContext) -> Vector3d {
    let contact_distance = ctx.params.contact_distance();

    let accumulated = match ctx.params.contact_policy {
        ContactPolicy::FirstFound => {
            let mut force = Vector3d::zeros();
            for obstacle in obstacles {
                let diff = probe - obstacle;
                let dist = diff.norm();
                if dist < contact_distance {
                    return contact_force(&diff, ctx);
                }
                force += inverse_square(&diff, dist, ctx.params.scale);
            }
            force
        }
        ContactPolicy::Nearest => {
            let search = BruteForceSearch::new(obstacles);
            if let Some((idx, _)) = search.nearest_within(probe, contact_distance) {
                return contact_force(&(probe - obstacles[idx]), ctx);
            }
            obstacles.iter().fold(Vector3d::zeros(), |force, obstacle| {
                let diff = probe - obstacle;
                force + inverse_square(&diff, diff.norm(), ctx.params.scale)
            })
        }
    };

    accumulated * ctx.polarity.sign()
}

fn contact_force(diff: &Vector3d, ctx: &FieldContext) -> Vector3d {
    match diff.try_normalize(f64::EPSILON) {
        Some(unit) => unit * (-ctx.params.scale * ctx.polarity.sign()),
        None => Vector3d::zeros(),
    }
}

fn inverse_square(diff: &Vector3d, dist: f64, scale: f64) -> Vector3d {
    match diff.try_normalize(f64::EPSILON) {
        Some(unit) => unit * (-scale / (dist * dist)),
        None => Vector3d::zeros(),
    }
}

/// A Coulomb field bound to a frozen obstacle set
#[derive(Debug, Clone)]
pub struct CoulombField {
    obstacles: Arc<ObstacleSet>,
    params: FieldParams,
}

impl CoulombField {
    pub fn new(obstacles: Arc<ObstacleSet>, params: FieldParams) -> Self {
        Self { obstacles, params }
    }

    pub fn obstacles(&self) -> &Arc<ObstacleSet> {
        &self.obstacles
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    /// Indices of the obstacles currently overlapping `probe`
    pub fn contacts(&self, probe: &Point3d) -> Vec<usize> {
        BruteForceSearch::new(self.obstacles.as_slice())
            .radius_neighbors(probe, self.params.contact_distance())
            .into_iter()
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl ForceField for CoulombField {
    fn force_at(&self, probe: &Point3d, polarity: Polarity) -> Vector3d {
        compute_force(probe, self.obstacles.as_slice(), &FieldContext::new(self.params, polarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ctx(polarity: Polarity) -> FieldContext {
        FieldContext::new(FieldParams::default(), polarity)
    }

    #[test]
    fn test_far_single_obstacle() {
        let obstacles = [Point3d::origin()];
        let probe = Point3d::new(100.0, 0.0, 0.0);

        let force = compute_force(&probe, &obstacles, &ctx(Polarity::Positive));
        assert_relative_eq!(force, Vector3d::new(-0.0012, 0.0, 0.0), epsilon = 1e-12);

        let force = compute_force(&probe, &obstacles, &ctx(Polarity::Negative));
        assert_relative_eq!(force, Vector3d::new(0.0012, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_overlapping_single_obstacle() {
        let obstacles = [Point3d::origin()];
        let probe = Point3d::new(10.0, 0.0, 0.0);

        let force = compute_force(&probe, &obstacles, &ctx(Polarity::Positive));
        assert_relative_eq!(force, Vector3d::new(-12.0, 0.0, 0.0), epsilon = 1e-12);

        let force = compute_force(&probe, &obstacles, &ctx(Polarity::Negative));
        assert_relative_eq!(force, Vector3d::new(12.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_obstacle_set_is_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let probe = Point3d::new(
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
            );
            assert_eq!(compute_force(&probe, &[], &ctx(Polarity::Positive)), Vector3d::zeros());
        }
    }

    #[test]
    fn test_coincident_probe_yields_zero_not_nan() {
        let obstacles = [Point3d::new(1.0, 2.0, 3.0)];
        let force = compute_force(&Point3d::new(1.0, 2.0, 3.0), &obstacles, &ctx(Polarity::Positive));
        assert_eq!(force, Vector3d::zeros());
    }

    #[test]
    fn test_boundary_distance_uses_inverse_square() {
        // dist == 2R is not an overlap
        let obstacles = [Point3d::origin()];
        let probe = Point3d::new(0.0, 30.0, 0.0);
        let force = compute_force(&probe, &obstacles, &ctx(Polarity::Positive));
        assert_relative_eq!(force, Vector3d::new(0.0, -12.0 / 900.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_superposition_when_nothing_overlaps() {
        let mut rng = StdRng::seed_from_u64(42);
        let probe = Point3d::new(0.0, 0.0, 0.0);
        let params = FieldParams::default();

        for _ in 0..16 {
            let count = rng.gen_range(1..20);
            let obstacles: Vec<Point3d> = (0..count)
                .map(|_| {
                    // Keep every obstacle outside the 2R contact sphere
                    let direction = Vector3d::new(
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                    )
                    .try_normalize(1e-6)
                    .unwrap_or(Vector3d::x());
                    probe + direction * rng.gen_range(30.0..400.0)
                })
                .collect();

            for polarity in [Polarity::Positive, Polarity::Negative] {
                let expected = obstacles.iter().fold(Vector3d::zeros(), |acc, o| {
                    let diff = probe - o;
                    let dist = diff.norm();
                    acc - diff.normalize() * params.scale() / (dist * dist)
                }) * polarity.sign();

                let force = compute_force(&probe, &obstacles, &FieldContext::new(params, polarity));
                assert_relative_eq!(force, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_first_overlap_in_storage_order_wins() {
        let probe = Point3d::origin();
        let obstacles = [
            Point3d::new(200.0, 0.0, 0.0),
            Point3d::new(0.0, 25.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
        ];

        let force = compute_force(&probe, &obstacles, &ctx(Polarity::Negative));
        // diff = (0, -25, 0), the nearer obstacle at index 2 is ignored
        assert_relative_eq!(force, Vector3d::new(0.0, -12.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_nearest_policy_picks_closest_overlap() {
        let probe = Point3d::origin();
        let obstacles = [
            Point3d::new(0.0, 25.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
        ];
        let params = FieldParams::default().with_contact_policy(ContactPolicy::Nearest);

        let force = compute_force(&probe, &obstacles, &FieldContext::new(params, Polarity::Positive));
        assert_relative_eq!(force, Vector3d::new(12.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_policies_agree_without_overlap() {
        let probe = Point3d::new(3.0, -2.0, 7.0);
        let obstacles = [Point3d::new(80.0, 0.0, 0.0), Point3d::new(0.0, -90.0, 10.0)];
        let first = compute_force(&probe, &obstacles, &ctx(Polarity::Positive));
        let params = FieldParams::default().with_contact_policy(ContactPolicy::Nearest);
        let nearest = compute_force(&probe, &obstacles, &FieldContext::new(params, Polarity::Positive));
        assert_relative_eq!(first, nearest, epsilon = 1e-15);
    }

    #[test]
    fn test_params_validation() {
        assert!(FieldParams::new(12.0, 0.0, ContactPolicy::FirstFound).is_err());
        assert!(FieldParams::new(12.0, -1.0, ContactPolicy::FirstFound).is_err());
        assert!(FieldParams::new(f64::INFINITY, 15.0, ContactPolicy::FirstFound).is_err());
        let params = FieldParams::try_from(&FieldConfig::default()).unwrap();
        assert_eq!(params, FieldParams::default());
        assert_eq!(params.contact_distance(), 30.0);
    }

    #[test]
    fn test_coulomb_field_contacts_and_force() {
        let obstacles = Arc::new(ObstacleSet::from_points(vec![
            Point3d::origin(),
            Point3d::new(100.0, 0.0, 0.0),
            Point3d::new(20.0, 0.0, 0.0),
        ]));
        let field = CoulombField::new(Arc::clone(&obstacles), FieldParams::default());

        assert_eq!(field.contacts(&Point3d::new(10.0, 0.0, 0.0)), vec![0, 2]);
        assert!(field.contacts(&Point3d::new(0.0, 500.0, 0.0)).is_empty());

        let force = field.force_at(&Point3d::new(10.0, 0.0, 0.0), Polarity::Positive);
        assert_relative_eq!(force, Vector3d::new(-12.0, 0.0, 0.0), epsilon = 1e-12);
    }
}
