//! Error types for microdomain generation and post-processing.

use thiserror::Error;

use crate::cell::GeneratorId;

/// Errors reported by a [`WeightedVoronoiSolver`](crate::WeightedVoronoiSolver).
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum SolverError {
    /// The bounding box does not fully contain the sphere of a generator.
    ///
    /// This is the only solver failure the tessellation generator recovers from.
    #[error("bounding box does not contain the sphere of generator {generator}")]
    DegenerateBoundingBox {
        /// First generator found outside the box.
        generator: GeneratorId,
    },
    /// Any other solver failure. Opaque to the generator.
    #[error("solver failed: {0}")]
    Failed(String),
}

/// Errors that can occur while building or transforming microdomains.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum MicrodomainError {
    /// Overlap factor outside `[0, 2)`.
    #[error("overlap factor {0} is outside of the valid range [0, 2)")]
    InvalidOverlapRange(f64),

    /// The overlap cubic did not yield a root with negligible imaginary part.
    #[error("no real root found for the scaling cubic of overlap {overlap}")]
    NoRealRootFound {
        /// The overlap factor that was being converted.
        overlap: f64,
    },

    /// A face loop refers to a vertex that does not exist.
    #[error("face {face} refers to vertex {index}, but only {len} vertices exist")]
    IndexOutOfBounds {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        index: i64,
        /// Number of vertices in the pool.
        len: usize,
    },

    /// A face loop with fewer than 3 vertices or a truncated flat buffer.
    #[error("face {face} is malformed: {len} vertices")]
    MalformedFace {
        /// Index of the offending face.
        face: usize,
        /// Number of vertices declared or present.
        len: usize,
    },

    /// Parallel sequences of different lengths.
    #[error("mismatched lengths for {what}: expected {expected}, found {found}")]
    MismatchedLengths {
        /// Which sequence pair disagrees.
        what: &'static str,
        /// Length of the leading sequence.
        expected: usize,
        /// Length of the trailing sequence.
        found: usize,
    },

    /// A cell vertex coincides with the soma it would be projected around.
    #[error("cannot project point {point:?} that coincides with the soma position")]
    DegenerateProjection {
        /// The coinciding vertex.
        point: [f32; 3],
    },

    /// A generator lies in no connected component of the region mask.
    #[error("generator {generator} at {position:?} is outside the region of interest")]
    GeneratorOutsideRegion {
        /// First generator found outside.
        generator: GeneratorId,
        /// Its position.
        position: [f32; 3],
    },

    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure of the weighted Voronoi solver, propagated unchanged.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Result type alias for microdomain operations.
pub type Result<T> = std::result::Result<T, MicrodomainError>;
