//! The weighted Voronoi primitive the tessellation generator is built on.

use crate::bounds::BoundingBox;
use crate::error::SolverError;

mod laguerre;

pub use laguerre::LaguerreSolver;

/// One cell as returned by a [`WeightedVoronoiSolver`].
pub trait NativeCell {
    /// Vertex positions of the polyhedron.
    fn vertices(&self) -> Vec<[f32; 3]>;

    /// Generator index behind each polygonal face, negative on the bounding box.
    fn neighbors(&self) -> Vec<i64>;

    /// Flat `[count, v_0, .., v_{count-1}, count, ..]` buffer of face vertex loops.
    fn face_vertices(&self) -> Vec<i64>;
}

/// Computes the Laguerre (power) tessellation of weighted points.
///
/// Implementations return exactly one cell per input point, in input order, and
/// must report a box that does not contain every sphere as
/// [`SolverError::DegenerateBoundingBox`].
pub trait WeightedVoronoiSolver {
    type Cell: NativeCell;

    fn compute(
        &self,
        points: &[[f32; 3]],
        radii: &[f32],
        bounds: &BoundingBox<3>,
        threads: usize,
    ) -> Result<Vec<Self::Cell>, SolverError>;
}

impl<S: WeightedVoronoiSolver + ?Sized> WeightedVoronoiSolver for &S {
    type Cell = S::Cell;

    fn compute(
        &self,
        points: &[[f32; 3]],
        radii: &[f32],
        bounds: &BoundingBox<3>,
        threads: usize,
    ) -> Result<Vec<Self::Cell>, SolverError> {
        (**self).compute(points, radii, bounds, threads)
    }
}
