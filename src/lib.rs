//! # microdomains
//!
//! `microdomains` partitions a box into convex microdomains, one per weighted generator
//! sphere, using a Laguerre (power) tessellation. It is usable from Rust and compiles to
//! WebAssembly (WASM).
//!
//! ## Features
//!
//! - **Laguerre tessellation**: cells are clipped by power bisector planes, with a uniform
//!   grid for neighbor lookups and rayon for per-cell parallelism.
//! - **Degenerate box recovery**: a box that does not contain every generator sphere is
//!   relaxed once before giving up.
//! - **Triangulated output**: every microdomain is a closed triangle mesh whose triangles
//!   remember the neighbor across their face.
//! - **Overlap scaling**: microdomains are inflated to a target overlap and clamped to the box.
//! - **Region of interest**: vertices outside a voxel mask are pulled back toward the soma.
//!
//! ## Main Interface
//!
//! [`TessellationGenerator`] turns spheres into [`Microdomain`]s, [`scale_microdomains`] and
//! [`limit_microdomains_to_roi`] post-process them, and [`build_microdomains`] chains the
//! three from a [`MicrodomainConfig`].

pub mod algorithm;
pub mod bounds;
pub mod cell;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod roi;
pub mod scaling;
pub mod solver;
pub mod tessellation;
pub mod triangulation;
pub mod wasm;

pub use algorithm::SpatialAlgorithm;
pub use algorithm::d3_grid::SpatialGrid;
pub use bounds::BoundingBox;
pub use bounds::BOX_ID_BOTTOM;
pub use bounds::BOX_ID_TOP;
pub use bounds::BOX_ID_FRONT;
pub use bounds::BOX_ID_BACK;
pub use bounds::BOX_ID_LEFT;
pub use bounds::BOX_ID_RIGHT;
pub use cell::GeneratorId;
pub use cell::Microdomain;
pub use cell::power::PowerCell;
pub use config::MicrodomainConfig;
pub use config::MicrodomainConfigBuilder;
pub use error::MicrodomainError;
pub use error::Result;
pub use error::SolverError;
pub use pipeline::MicrodomainSet;
pub use pipeline::build_microdomains;
pub use roi::ConnectedComponents;
pub use roi::RegionMask;
pub use roi::VoxelMask;
pub use roi::ROI_EPSILON;
pub use roi::limit_microdomain_to_roi;
pub use roi::limit_microdomains_to_roi;
pub use scaling::OverlapDistribution;
pub use scaling::scale_microdomains;
pub use scaling::scale_microdomains_par;
pub use scaling::scaling_factor_from_overlap;
pub use solver::LaguerreSolver;
pub use solver::NativeCell;
pub use solver::WeightedVoronoiSolver;
pub use tessellation::Microdomains;
pub use tessellation::TessellationGenerator;
pub use tessellation::generate_microdomain_tessellation;
pub use triangulation::polygons_to_triangles;
