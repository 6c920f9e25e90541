use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hapticfield_algorithms::{compute_force, FieldContext, FieldParams};
use hapticfield_core::{ContactPolicy, Point3d, Polarity};

const OBSTACLE_COUNTS: [usize; 4] = [16, 128, 1024, 8192];

fn ring(count: usize) -> Vec<Point3d> {
    (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * std::f64::consts::TAU;
            Point3d::new(200.0 * angle.cos(), 200.0 * angle.sin(), 0.0)
        })
        .collect()
}

fn coulomb_force(c: &mut Criterion) {
    let probe = Point3d::new(0.0, 0.0, 40.0);

    let mut g = c.benchmark_group("coulomb force");
    for policy in [ContactPolicy::FirstFound, ContactPolicy::Nearest] {
        let ctx = FieldContext::new(
            FieldParams::default().with_contact_policy(policy),
            Polarity::Positive,
        );
        for count in OBSTACLE_COUNTS {
            let obstacles = ring(count);
            g.bench_with_input(BenchmarkId::new(format!("{:?}", policy), count), &obstacles, |b, obstacles| {
                b.iter(|| compute_force(std::hint::black_box(&probe), std::hint::black_box(obstacles), &ctx));
            });
        }
    }

    g.finish();
}

criterion_group!(benches, coulomb_force);
criterion_main!(benches);
