use criterion::{black_box, criterion_group, criterion_main, Criterion};
use microdomains::{
    BoundingBox, Microdomain, OverlapDistribution, generate_microdomain_tessellation, scale_microdomains,
    scale_microdomains_par, scaling_factor_from_overlap,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const GRID_SIZE: usize = 16;

fn lattice_microdomains() -> (Vec<Microdomain>, BoundingBox<3>) {
    let size = GRID_SIZE as f64;
    let bounds = BoundingBox::new([0.0; 3], [size; 3]);
    let mut points = Vec::with_capacity(GRID_SIZE * GRID_SIZE * GRID_SIZE);
    for x in 0..GRID_SIZE {
        for y in 0..GRID_SIZE {
            for z in 0..GRID_SIZE {
                points.push([x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5]);
            }
        }
    }
    let radii = vec![0.25; points.len()];
    let cells = generate_microdomain_tessellation(&points, &radii, bounds)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    (cells, bounds)
}

fn benchmark_scaling_factor(c: &mut Criterion) {
    c.bench_function("scaling_factor_from_overlap", |b| {
        b.iter(|| scaling_factor_from_overlap(black_box(0.37)))
    });
}

fn benchmark_scale_microdomains(c: &mut Criterion) {
    let (cells, bounds) = lattice_microdomains();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let factors = OverlapDistribution::new(0.2, 0.02)
        .sample_scaling_factors(cells.len(), &mut rng)
        .unwrap();

    c.bench_function("scale_microdomains_lazy", |b| {
        b.iter(|| {
            scale_microdomains(cells.iter().cloned(), factors.iter().copied(), bounds)
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
        })
    });

    c.bench_function("scale_microdomains_par", |b| {
        b.iter(|| scale_microdomains_par(black_box(&cells), black_box(&factors), bounds).unwrap())
    });
}

criterion_group!(benches, benchmark_scaling_factor, benchmark_scale_microdomains);
criterion_main!(benches);
