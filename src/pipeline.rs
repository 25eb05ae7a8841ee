//! End-to-end microdomain build: tessellate, inflate to the sampled overlap,
//! then pull the geometry back into the region of interest.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::bounds::BoundingBox;
use crate::cell::{GeneratorId, Microdomain};
use crate::config::MicrodomainConfig;
use crate::error::{MicrodomainError, Result, SolverError};
use crate::roi::{RegionMask, limit_microdomains_to_roi};
use crate::scaling::scale_microdomains_par;
use crate::solver::WeightedVoronoiSolver;
use crate::tessellation::TessellationGenerator;

/// Result of [`build_microdomains`], every vector in generator order.
#[derive(Clone, Debug, PartialEq)]
pub struct MicrodomainSet {
    /// The Laguerre tessellation, a partition of the bounding box.
    pub microdomains: Vec<Microdomain>,
    /// Inflated microdomains, limited to the region of interest when a mask was given.
    pub overlapping: Vec<Microdomain>,
    /// Scaling factor applied to each microdomain.
    pub scaling_factors: Vec<f64>,
}

impl MicrodomainSet {
    pub fn len(&self) -> usize {
        self.microdomains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.microdomains.is_empty()
    }
}

/// Builds the microdomains of all generator spheres inside `bounding_box`.
///
/// With a region mask, the generators are split by the 6-connected component
/// of the mask they lie in, and each component is tessellated and scaled in
/// the box of its own voxels; `bounding_box` is then unused. Neighbor ids are
/// global generator indices either way, and neighbors never cross components.
///
/// Scaling factors come from overlap factors drawn from the configured normal
/// distribution with the configured seed, in generator order. Any error aborts
/// the whole build.
pub fn build_microdomains<S, M>(
    config: &MicrodomainConfig,
    solver: S,
    positions: &[[f32; 3]],
    radii: &[f32],
    bounding_box: BoundingBox<3>,
    region_mask: Option<&M>,
) -> Result<MicrodomainSet>
where
    S: WeightedVoronoiSolver,
    M: RegionMask + ?Sized,
{
    tracing::info!(generators = positions.len(), seed = config.seed, "generating microdomains");

    if positions.len() != radii.len() {
        return Err(MicrodomainError::MismatchedLengths {
            what: "generator points and radii",
            expected: positions.len(),
            found: radii.len(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let scaling_factors = config
        .overlap_distribution()
        .sample_scaling_factors(positions.len(), &mut rng)?;

    let generator = TessellationGenerator::new(solver).with_threads(config.threads);

    let Some(mask) = region_mask else {
        let microdomains: Vec<Microdomain> = generator
            .generate(positions, radii, bounding_box)?
            .collect::<Result<_>>()?;
        tracing::info!("scaling microdomains");
        let overlapping = scale_microdomains_par(&microdomains, &scaling_factors, bounding_box)?;
        tracing::debug!(microdomains = microdomains.len(), "microdomains built");
        return Ok(MicrodomainSet { microdomains, overlapping, scaling_factors });
    };

    let components = mask.connected_components()?;
    let groups = components.partition(positions)?;

    let mut microdomains = vec![Microdomain::empty(); positions.len()];
    let mut overlapping = vec![Microdomain::empty(); positions.len()];
    for (component, members) in groups.iter().enumerate() {
        let Some(component_box) = components.bounding_box(component) else {
            continue;
        };
        if members.is_empty() {
            continue;
        }

        let local_positions: Vec<[f32; 3]> = members.iter().map(|&i| positions[i]).collect();
        let local_radii: Vec<f32> = members.iter().map(|&i| radii[i]).collect();
        let local_factors: Vec<f64> = members.iter().map(|&i| scaling_factors[i]).collect();

        let to_global = |id: GeneratorId| GeneratorId(members[id.index()]);
        let cells: Vec<Microdomain> = generator
            .generate(&local_positions, &local_radii, component_box)
            .map_err(|e| match e {
                MicrodomainError::Solver(SolverError::DegenerateBoundingBox { generator: local }) => {
                    SolverError::DegenerateBoundingBox { generator: to_global(local) }.into()
                }
                other => other,
            })?
            .map(|cell| cell.map(|c| c.map_neighbors(to_global)))
            .collect::<Result<_>>()?;

        let scaled = scale_microdomains_par(&cells, &local_factors, component_box)?;
        for ((&i, cell), scaled) in members.iter().zip(cells).zip(scaled) {
            microdomains[i] = cell;
            overlapping[i] = scaled;
        }
        tracing::debug!(component, microdomains = members.len(), "built microdomains of connected component");
    }

    tracing::info!(components = components.len(), "moving microdomain points inside the region of interest");
    let overlapping = limit_microdomains_to_roi(overlapping, positions.iter().copied(), mask).collect::<Result<_>>()?;

    tracing::debug!(microdomains = microdomains.len(), "microdomains built");
    Ok(MicrodomainSet {
        microdomains,
        overlapping,
        scaling_factors,
    })
}
