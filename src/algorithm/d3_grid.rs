use crate::algorithm::SpatialAlgorithm;
use crate::bounds::BoundingBox;

/// Targeted mean number of generators per bin.
const GENERATORS_PER_BIN: f64 = 3.0;
/// Upper bound on the resolution per axis, keeps the search order table small.
const MAX_BINS_PER_AXIS: usize = 24;

/// A spatial index based on a uniform grid.
///
/// This structure divides the box into bins sized so that each holds a few
/// generators on average, and visits bins in order of increasing distance.
pub struct SpatialGrid {
    /// Number of bins along each axis.
    pub grid_res: [usize; 3],
    /// Scale factor from coordinate to grid index per axis.
    pub grid_scale: [f64; 3],
    /// Maximum valid (fractional) index per axis.
    pub grid_limit: [f64; 3],
    /// Minimum corner of the grid bounds.
    pub min: [f64; 3],
    /// The grid bins, each containing a list of generator indices.
    pub grid_bins: Vec<Vec<usize>>,
    /// Map from generator index to its bin index.
    pub generator_bin_ids: Vec<usize>,
    /// Precomputed search order for visiting neighboring bins.
    pub bin_search_order: Vec<([isize; 3], f64)>,
}

impl SpatialGrid {
    /// Creates an empty grid with the given resolution over `bounds`.
    pub fn new(res: [usize; 3], bounds: &BoundingBox<3>) -> Self {
        let extent = bounds.extent();
        let mut grid_scale = [0.0; 3];
        let mut grid_limit = [0.0; 3];
        let mut cell_size = [0.0; 3];
        for k in 0..3 {
            let res_k = res[k].max(1);
            grid_scale[k] = res_k as f64 / extent[k].max(f64::MIN_POSITIVE);
            grid_limit[k] = res_k as f64 - 1e-5;
            cell_size[k] = 1.0 / grid_scale[k];
        }

        let [rx, ry, rz] = res.map(|r| r.max(1) as isize);
        let mut bin_search_order = Vec::with_capacity(((2 * rx + 1) * (2 * ry + 1) * (2 * rz + 1)) as usize);
        for z in -rz..=rz {
            for y in -ry..=ry {
                for x in -rx..=rx {
                    let offset = [x, y, z];
                    bin_search_order.push((offset, min_dist_sq(offset, cell_size)));
                }
            }
        }
        bin_search_order.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        SpatialGrid {
            grid_res: res.map(|r| r.max(1)),
            grid_scale,
            grid_limit,
            min: bounds.min,
            grid_bins: vec![Vec::new(); (rx * ry * rz) as usize],
            generator_bin_ids: Vec::new(),
            bin_search_order,
        }
    }

    /// Picks a resolution for `count` generators spread over `bounds`.
    pub fn resolution_for(count: usize, bounds: &BoundingBox<3>) -> [usize; 3] {
        let extent = bounds.extent();
        let volume = extent.iter().map(|e| e.max(f64::MIN_POSITIVE)).product::<f64>();
        let bin_size = (volume * GENERATORS_PER_BIN / count.max(1) as f64).cbrt();
        extent.map(|e| ((e / bin_size).ceil() as usize).clamp(1, MAX_BINS_PER_AXIS))
    }

    fn bin_coords(&self, pos: &[f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for k in 0..3 {
            out[k] = ((pos[k] - self.min[k]) * self.grid_scale[k]).clamp(0.0, self.grid_limit[k]);
        }
        out
    }

    /// Calculates the linear index of the bin containing the given position.
    pub fn bin_index(&self, pos: &[f64; 3]) -> usize {
        let [ix, iy, iz] = self.bin_coords(pos).map(|c| c as usize);
        ix + iy * self.grid_res[0] + iz * self.grid_res[0] * self.grid_res[1]
    }
}

impl SpatialAlgorithm for SpatialGrid {
    fn build(generators: &[[f64; 3]], bounds: &BoundingBox<3>) -> Self {
        let mut grid = SpatialGrid::new(SpatialGrid::resolution_for(generators.len(), bounds), bounds);
        grid.generator_bin_ids = Vec::with_capacity(generators.len());
        for (i, g) in generators.iter().enumerate() {
            let bin_idx = grid.bin_index(g);
            grid.grid_bins[bin_idx].push(i);
            grid.generator_bin_ids.push(bin_idx);
        }
        grid
    }

    fn visit_neighbors<F>(&self, generators: &[[f64; 3]], index: usize, reach_sq: &mut f64, mut visitor: F)
    where
        F: FnMut(usize, [f64; 3], f64) -> f64,
    {
        let [nx, ny, nz] = self.grid_res;
        let coords = self.bin_coords(&generators[index]);
        let home = coords.map(|c| c as isize);
        let rel = [
            coords[0] - home[0] as f64,
            coords[1] - home[1] as f64,
            coords[2] - home[2] as f64,
        ];

        for &(offset, min_d2) in &self.bin_search_order {
            if min_d2 > *reach_sq {
                break;
            }

            let b = [home[0] + offset[0], home[1] + offset[1], home[2] + offset[2]];
            if b[0] < 0 || b[0] >= nx as isize || b[1] < 0 || b[1] >= ny as isize || b[2] < 0 || b[2] >= nz as isize {
                continue;
            }

            // Distance from the generator itself to the bin, tighter than `min_d2`
            let mut bin_d2 = 0.0;
            for k in 0..3 {
                let d = offset[k];
                let gap = if d > 0 {
                    (d as f64 - rel[k]) / self.grid_scale[k]
                } else if d < 0 {
                    (-(d + 1) as f64 + rel[k]) / self.grid_scale[k]
                } else {
                    0.0
                };
                let gap = gap.max(0.0);
                bin_d2 += gap * gap;
            }
            if bin_d2 > *reach_sq {
                continue;
            }

            let bin_index = b[0] as usize + b[1] as usize * nx + b[2] as usize * nx * ny;
            for &j in &self.grid_bins[bin_index] {
                if index == j {
                    continue;
                }
                *reach_sq = visitor(j, generators[j], *reach_sq);
                if *reach_sq < 0.0 {
                    return;
                }
            }
        }
    }
}

/// Lower bound of the squared distance between points of two bins `offset` apart.
fn min_dist_sq(offset: [isize; 3], cell_size: [f64; 3]) -> f64 {
    let mut d2 = 0.0;
    for k in 0..3 {
        let d = offset[k];
        let m = if d > 0 { (d - 1) as f64 * cell_size[k] } else if d < 0 { (-d - 1) as f64 * cell_size[k] } else { 0.0 };
        d2 += m * m;
    }
    d2
}
