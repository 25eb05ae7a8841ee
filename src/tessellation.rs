use crate::bounds::BoundingBox;
use crate::cell::Microdomain;
use crate::cell::power::PowerCell;
use crate::error::{MicrodomainError, Result, SolverError};
use crate::solver::{LaguerreSolver, NativeCell, WeightedVoronoiSolver};
use crate::triangulation::{polygons_to_triangles, split_face_loops};

/// Turns weighted generator points into triangulated microdomains.
///
/// Wraps a [`WeightedVoronoiSolver`] and recovers once from a bounding box that
/// does not contain every generator sphere.
pub struct TessellationGenerator<S: WeightedVoronoiSolver> {
    solver: S,
    threads: usize,
}

impl<S: WeightedVoronoiSolver> TessellationGenerator<S> {
    pub fn new(solver: S) -> Self {
        Self { solver, threads: 1 }
    }

    /// Thread count handed to the solver; `0` lets the solver decide.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Computes the tessellation and returns the microdomains in generator order.
    ///
    /// The solver runs once here; the returned iterator only converts its cells
    /// and can be consumed a single time.
    ///
    /// If the solver rejects `bounding_box` as degenerate, the computation is
    /// retried exactly once with the union of the box and the bound of all
    /// spheres. A second failure is returned to the caller.
    pub fn generate(
        &self,
        generator_points: &[[f32; 3]],
        generator_radii: &[f32],
        bounding_box: BoundingBox<3>,
    ) -> Result<Microdomains<S::Cell>> {
        if generator_points.len() != generator_radii.len() {
            return Err(MicrodomainError::MismatchedLengths {
                what: "generator points and radii",
                expected: generator_points.len(),
                found: generator_radii.len(),
            });
        }

        let cells = match self.solver.compute(generator_points, generator_radii, &bounding_box, self.threads) {
            Ok(cells) => cells,
            Err(SolverError::DegenerateBoundingBox { generator }) => {
                let relaxed = BoundingBox::from_spheres(generator_points, generator_radii) + bounding_box;
                tracing::warn!(
                    %generator,
                    original = ?bounding_box,
                    ?relaxed,
                    "bounding box does not contain all generator spheres, retrying with relaxed box"
                );
                self.solver.compute(generator_points, generator_radii, &relaxed, self.threads)?
            }
            Err(err) => return Err(err.into()),
        };

        if cells.len() != generator_points.len() {
            return Err(MicrodomainError::MismatchedLengths {
                what: "generator points and solver cells",
                expected: generator_points.len(),
                found: cells.len(),
            });
        }

        tracing::debug!(cells = cells.len(), "tessellation computed");
        Ok(Microdomains { cells: cells.into_iter(), index: 0 })
    }
}

/// Generates the microdomain tessellation with the built-in [`LaguerreSolver`]
/// on a single thread.
pub fn generate_microdomain_tessellation(
    generator_points: &[[f32; 3]],
    generator_radii: &[f32],
    bounding_box: BoundingBox<3>,
) -> Result<Microdomains<PowerCell>> {
    TessellationGenerator::new(LaguerreSolver::new()).generate(generator_points, generator_radii, bounding_box)
}

/// Single-pass iterator converting solver cells into microdomains.
pub struct Microdomains<C> {
    cells: std::vec::IntoIter<C>,
    index: usize,
}

impl<C: NativeCell> Iterator for Microdomains<C> {
    type Item = Result<Microdomain>;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.cells.next()?;
        let index = self.index;
        self.index += 1;
        Some(to_microdomain(&cell).inspect(|m| {
            if m.is_empty() {
                tracing::warn!(generator = index, "empty Laguerre cell");
            }
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cells.size_hint()
    }
}

impl<C: NativeCell> ExactSizeIterator for Microdomains<C> {}

/// Converts one solver cell: fan-triangulates its faces and gives every
/// triangle the neighbor of the face it came from.
pub fn to_microdomain<C: NativeCell>(cell: &C) -> Result<Microdomain> {
    let points = cell.vertices();
    let face_neighbors = cell.neighbors();
    let faces = split_face_loops(&cell.face_vertices())?;

    if faces.len() != face_neighbors.len() {
        return Err(MicrodomainError::MismatchedLengths {
            what: "faces and face neighbors",
            expected: faces.len(),
            found: face_neighbors.len(),
        });
    }

    let (triangles, face_ids) = polygons_to_triangles(&points, &faces)?;

    let neighbor_ids: Vec<i64> = face_ids.iter().map(|&f| face_neighbors[f as usize]).collect();
    let triangle_data: Vec<[i64; 4]> = face_ids
        .iter()
        .zip(&triangles)
        .map(|(&f, t)| [f, t[0], t[1], t[2]])
        .collect();

    Microdomain::new(points, triangle_data, neighbor_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tetrahedron;

    impl NativeCell for Tetrahedron {
        fn vertices(&self) -> Vec<[f32; 3]> {
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
        }

        fn neighbors(&self) -> Vec<i64> {
            vec![4, -1, 9, -5]
        }

        fn face_vertices(&self) -> Vec<i64> {
            vec![3, 0, 2, 1, 3, 0, 1, 3, 3, 0, 3, 2, 3, 1, 2, 3]
        }
    }

    #[test]
    fn test_to_microdomain() {
        let m = to_microdomain(&Tetrahedron).unwrap();
        assert_eq!(m.points().len(), 4);
        assert_eq!(m.triangle_data(), &[[0, 0, 2, 1], [1, 0, 1, 3], [2, 0, 3, 2], [3, 1, 2, 3]]);
        assert_eq!(m.neighbor_ids(), &[4, -1, 9, -5]);
        assert!((m.volume() - 1.0 / 6.0).abs() < 1e-9);
    }
}
