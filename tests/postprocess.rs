use microdomains::{
    BoundingBox, LaguerreSolver, Microdomain, MicrodomainConfigBuilder, MicrodomainError, VoxelMask,
    build_microdomains, generate_microdomain_tessellation, limit_microdomains_to_roi, scale_microdomains,
    scaling_factor_from_overlap,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn lattice(n: usize, spacing: f32) -> Vec<[f32; 3]> {
    let mut points = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                points.push([
                    (x as f32 + 0.5) * spacing,
                    (y as f32 + 0.5) * spacing,
                    (z as f32 + 0.5) * spacing,
                ]);
            }
        }
    }
    points
}

fn tessellate(points: &[[f32; 3]], radii: &[f32], bounds: BoundingBox<3>) -> Vec<Microdomain> {
    generate_microdomain_tessellation(points, radii, bounds)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn test_scaling_keeps_topology() {
    let bounds = BoundingBox::new([0.0; 3], [12.0; 3]);
    let points = lattice(3, 4.0);
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let radii: Vec<f32> = (0..points.len()).map(|_| rng.gen_range(0.5..1.5)).collect();
    let cells = tessellate(&points, &radii, bounds);

    let factors: Vec<f64> = (0..cells.len()).map(|i| scaling_factor_from_overlap(0.02 * i as f64).unwrap()).collect();
    let scaled: Vec<Microdomain> = scale_microdomains(cells.clone(), factors.iter().copied(), bounds)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(scaled.len(), cells.len());
    for (original, inflated) in cells.iter().zip(&scaled) {
        assert_eq!(original.triangle_data(), inflated.triangle_data());
        assert_eq!(original.neighbor_ids(), inflated.neighbor_ids());
        assert_eq!(original.points().len(), inflated.points().len());
        for p in inflated.points() {
            assert!(p.iter().all(|&c| (0.0..=12.0).contains(&c)));
        }
    }
}

#[test]
fn test_scaling_reports_missing_factors() {
    let bounds = BoundingBox::new([0.0; 3], [8.0; 3]);
    let points = lattice(2, 4.0);
    let cells = tessellate(&points, &[1.0; 8], bounds);

    let results: Vec<_> = scale_microdomains(cells, vec![1.1; 6], bounds).collect();
    assert_eq!(results.len(), 7);
    assert!(results[..6].iter().all(|r| r.is_ok()));
    assert!(matches!(results[6], Err(MicrodomainError::MismatchedLengths { .. })));
}

#[test]
fn test_roi_keeps_cells_inside_mask_untouched() {
    let bounds = BoundingBox::new([0.0; 3], [8.0; 3]);
    let points = lattice(2, 4.0);
    let cells = tessellate(&points, &[1.0; 8], bounds);
    let mask = VoxelMask::from_fn([8, 8, 8], [1.0; 3], [0.0; 3], |_| 1).unwrap();

    let limited: Vec<Microdomain> = limit_microdomains_to_roi(cells.clone(), points.iter().copied(), &mask)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(limited, cells);
}

#[test]
fn test_pipeline_with_spherical_mask() {
    let bounds = BoundingBox::new([0.0; 3], [12.0; 3]);
    let points = lattice(3, 4.0);
    let radii = vec![1.0; points.len()];
    let mask = VoxelMask::from_fn([24, 24, 24], [0.5; 3], [0.0; 3], |[x, y, z]| {
        let c = [x, y, z].map(|i| (i as f64 + 0.5) * 0.5 - 6.0);
        // Radius 7 reaches every lattice point but not the box corners
        (c[0] * c[0] + c[1] * c[1] + c[2] * c[2] < 49.0) as i32
    })
    .unwrap();
    let config = MicrodomainConfigBuilder::new()
        .overlap(0.3, 0.02)
        .unwrap()
        .seed(1234)
        .threads(2)
        .build()
        .unwrap();

    let set = build_microdomains(&config, LaguerreSolver::new(), &points, &radii, bounds, Some(&mask)).unwrap();
    assert_eq!(set.len(), 27);
    assert_eq!(set.overlapping.len(), 27);
    assert_eq!(set.scaling_factors.len(), 27);

    let total: f64 = set.microdomains.iter().map(|m| m.volume()).sum();
    assert!((total - 1728.0).abs() < 1e-2);

    for ((m, o), soma) in set.microdomains.iter().zip(&set.overlapping).zip(&points) {
        assert_eq!(m.triangle_data(), o.triangle_data());
        assert_eq!(m.neighbor_ids(), o.neighbor_ids());
        assert!(o.points().iter().flatten().all(|c| c.is_finite()));
        // The central cell sits well inside the sphere
        if *soma == [6.0, 6.0, 6.0] {
            let factor = set.scaling_factors[13];
            assert!((o.volume() - m.volume() * factor.powi(3)).abs() < 1e-2);
        }
    }

    let again = build_microdomains(&config, LaguerreSolver::new(), &points, &radii, bounds, Some(&mask)).unwrap();
    assert_eq!(set, again);
}
