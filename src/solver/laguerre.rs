use std::marker::PhantomData;

use rayon::prelude::*;

use crate::algorithm::SpatialAlgorithm;
use crate::algorithm::d3_grid::SpatialGrid;
use crate::bounds::BoundingBox;
use crate::cell::GeneratorId;
use crate::cell::power::{PowerCell, PowerCellScratch};
use crate::error::SolverError;
use crate::solver::{NativeCell, WeightedVoronoiSolver};

/// Laguerre tessellation by clipping each generator's box against the power
/// bisector planes of its neighbors.
///
/// The power bisector of `i` and `j` is the plane with normal `p_j - p_i`
/// through `p_i + (p_j - p_i) * (0.5 + (r_i² - r_j²) / (2 |p_j - p_i|²))`.
pub struct LaguerreSolver<A: SpatialAlgorithm = SpatialGrid> {
    algorithm: PhantomData<fn() -> A>,
}

impl LaguerreSolver {
    pub fn new() -> Self {
        Self { algorithm: PhantomData }
    }
}

impl Default for LaguerreSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: SpatialAlgorithm> LaguerreSolver<A> {
    /// Solver using a custom neighbor search.
    pub fn with_algorithm() -> Self {
        Self { algorithm: PhantomData }
    }

    fn compute_cells(generators: &[[f64; 3]], weights: &[f64], bounds: &BoundingBox<3>) -> Vec<PowerCell> {
        let algorithm = A::build(generators, bounds);
        let max_weight = weights.iter().copied().fold(0.0, f64::max);
        let extent = bounds.extent().iter().fold(1.0f64, |acc, &e| acc.max(e));
        let coincident_sq = (1e-9 * extent) * (1e-9 * extent);

        (0..generators.len())
            .into_par_iter()
            .map_init(PowerCellScratch::default, |scratch, i| {
                let g = generators[i];
                let w_i = weights[i];
                let mut cell = PowerCell::new(i, g, bounds);
                let mut reach_sq = reach(cell.max_radius_sq(), w_i, max_weight);

                algorithm.visit_neighbors(generators, i, &mut reach_sq, |j, n_pos, cur_reach| {
                    let d = [n_pos[0] - g[0], n_pos[1] - g[1], n_pos[2] - g[2]];
                    let dist_sq = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
                    if dist_sq > cur_reach {
                        return cur_reach;
                    }

                    let w_j = weights[j];
                    if dist_sq <= coincident_sq {
                        // Same center: the heavier sphere takes the whole region
                        if w_j > w_i {
                            cell.clear();
                            return -1.0;
                        }
                        return cur_reach;
                    }

                    let t = 0.5 + (w_i - w_j) / (2.0 * dist_sq);
                    let point = [g[0] + d[0] * t, g[1] + d[1] * t, g[2] + d[2] * t];
                    let len = dist_sq.sqrt();
                    let normal = [d[0] / len, d[1] / len, d[2] / len];

                    match cell.clip(&point, &normal, j as i64, scratch) {
                        Some(_) if cell.is_empty() => -1.0,
                        Some(radius_sq) => reach(radius_sq, w_i, max_weight),
                        None => cur_reach,
                    }
                });

                cell
            })
            .collect()
    }
}

/// Squared distance past which no generator can cut a cell of squared radius
/// `radius_sq` around a generator of weight `w_i`.
///
/// A neighbor at distance `D` with weight at most `w_max` has its plane at
/// least `(D² + w_i - w_max) / 2D` away, so it only cuts while
/// `D < R + sqrt(R² + w_max - w_i)`.
fn reach(radius_sq: f64, w_i: f64, w_max: f64) -> f64 {
    let r = radius_sq.sqrt();
    let d = r + (radius_sq + (w_max - w_i).max(0.0)).sqrt();
    d * d
}

impl<A: SpatialAlgorithm> WeightedVoronoiSolver for LaguerreSolver<A> {
    type Cell = PowerCell;

    fn compute(
        &self,
        points: &[[f32; 3]],
        radii: &[f32],
        bounds: &BoundingBox<3>,
        threads: usize,
    ) -> Result<Vec<PowerCell>, SolverError> {
        if points.len() != radii.len() {
            return Err(SolverError::Failed(format!(
                "{} points but {} radii",
                points.len(),
                radii.len()
            )));
        }
        if !bounds.min.iter().chain(&bounds.max).all(|v| v.is_finite()) {
            return Err(SolverError::Failed(format!("non-finite bounding box {:?}", bounds)));
        }

        let mut generators: Vec<[f64; 3]> = Vec::with_capacity(points.len());
        let mut weights: Vec<f64> = Vec::with_capacity(points.len());
        for (i, (p, &r)) in points.iter().zip(radii).enumerate() {
            let center = p.map(|c| c as f64);
            let radius = r as f64;
            if !center.iter().all(|c| c.is_finite()) || !radius.is_finite() || radius < 0.0 {
                return Err(SolverError::Failed(format!("invalid sphere {}: {:?}, radius {}", i, p, r)));
            }
            if !bounds.contains_sphere(&center, radius) {
                return Err(SolverError::DegenerateBoundingBox { generator: GeneratorId(i) });
            }
            generators.push(center);
            weights.push(radius * radius);
        }

        tracing::debug!(generators = generators.len(), threads, ?bounds, "computing Laguerre cells");

        let cells = if threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| SolverError::Failed(e.to_string()))?;
            pool.install(|| Self::compute_cells(&generators, &weights, bounds))
        } else {
            Self::compute_cells(&generators, &weights, bounds)
        };

        Ok(cells)
    }
}

impl NativeCell for PowerCell {
    fn vertices(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.map(|c| c as f32)).collect()
    }

    fn neighbors(&self) -> Vec<i64> {
        self.face_neighbors.clone()
    }

    fn face_vertices(&self) -> Vec<i64> {
        self.face_vertex_buffer()
    }
}
