use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use microdomains::{BoundingBox, LaguerreSolver, Microdomain, TessellationGenerator, WeightedVoronoiSolver};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SIZE: f32 = 100.0;

fn random_spheres(count: usize) -> (Vec<[f32; 3]>, Vec<f32>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut points = Vec::with_capacity(count);
    let mut radii = Vec::with_capacity(count);
    for _ in 0..count {
        let r: f32 = rng.gen_range(0.1..1.0);
        points.push([
            rng.gen_range(r..SIZE - r),
            rng.gen_range(r..SIZE - r),
            rng.gen_range(r..SIZE - r),
        ]);
        radii.push(r);
    }
    (points, radii)
}

fn benchmark_solver(c: &mut Criterion) {
    let bounds = BoundingBox::new([0.0; 3], [SIZE as f64; 3]);
    let mut group = c.benchmark_group("laguerre_solver");

    for count in [1_000, 10_000] {
        let (points, radii) = random_spheres(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            let solver = LaguerreSolver::new();
            b.iter(|| solver.compute(black_box(&points), black_box(&radii), &bounds, 0))
        });
    }
    group.finish();
}

fn benchmark_generate(c: &mut Criterion) {
    let bounds = BoundingBox::new([0.0; 3], [SIZE as f64; 3]);
    let (points, radii) = random_spheres(10_000);
    let generator = TessellationGenerator::new(LaguerreSolver::new()).with_threads(0);

    c.bench_function("generate_10000_microdomains", |b| {
        b.iter(|| {
            let cells: Vec<Microdomain> = generator
                .generate(black_box(&points), black_box(&radii), bounds)
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();
            cells
        })
    });
}

criterion_group!(benches, benchmark_solver, benchmark_generate);
criterion_main!(benches);
