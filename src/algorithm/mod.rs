use crate::bounds::BoundingBox;

pub mod d3_grid;

/// Trait defining a spatial acceleration structure over generator positions.
/// This allows swapping the neighbor search used by the Laguerre solver.
pub trait SpatialAlgorithm: Send + Sync + Sized {
    /// Build the index for the given generators, all of which lie inside `bounds`.
    fn build(generators: &[[f64; 3]], bounds: &BoundingBox<3>) -> Self;

    /// Visit potential neighbors for a given generator.
    ///
    /// # Arguments
    /// * `generators` - The full list of generators (needed to retrieve neighbor positions).
    /// * `index` - The index of the generator we are processing.
    /// * `reach_sq` - Squared distance beyond which no neighbor can affect the cell.
    ///                The visitor returns the updated value as the cell shrinks; a
    ///                negative value ends the search.
    /// * `visitor` - A closure called for each candidate neighbor. It receives the neighbor's index,
    ///               its position and the current reach.
    fn visit_neighbors<F>(&self, generators: &[[f64; 3]], index: usize, reach_sq: &mut f64, visitor: F)
    where
        F: FnMut(usize, [f64; 3], f64) -> f64;
}
