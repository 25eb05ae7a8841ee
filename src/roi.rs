//! Pulling microdomain geometry back inside a voxelized region of interest.

use std::collections::VecDeque;

use crate::bounds::BoundingBox;
use crate::cell::{GeneratorId, Microdomain};
use crate::error::{MicrodomainError, Result};

/// Offset below the upper wall of the mask box used for the inside test, so that
/// points lying exactly on the wall do not fall out of the last voxel.
pub const ROI_EPSILON: f64 = 1e-5;

/// Shortest soma to vertex distance that can still be projected.
const MIN_PROJECTION_LENGTH: f64 = 1e-12;

/// A voxelized region: label `0` is background, anything else is inside.
pub trait RegionMask {
    /// Number of voxels along each axis.
    fn shape(&self) -> [i64; 3];

    /// Voxel size along each axis. May be negative for decreasing axes.
    fn voxel_dimensions(&self) -> [f64; 3];

    /// Position of the grid origin.
    fn offset(&self) -> [f64; 3];

    /// Label of the voxel containing each point, `outer_value` for points outside the grid.
    fn lookup(&self, points: &[[f64; 3]], outer_value: i32) -> Result<Vec<i32>>;

    /// Spatial extent of the grid.
    fn bounding_box(&self) -> BoundingBox<3> {
        BoundingBox::from_voxel_data(self.shape(), self.voxel_dimensions(), self.offset())
    }

    /// 6-connected components of the inside voxels, found by looking up every voxel center.
    fn connected_components(&self) -> Result<ConnectedComponents> {
        let shape = grid_shape(self.shape())?;
        let dims = self.voxel_dimensions();
        let offset = self.offset();
        let [nx, ny, nz] = shape;
        let mut centers = Vec::with_capacity(nx * ny * nz);
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let index = [x, y, z];
                    centers.push([0, 1, 2].map(|k| offset[k] + (index[k] as f64 + 0.5) * dims[k]));
                }
            }
        }
        let labels = self.lookup(&centers, 0)?;
        if labels.len() != centers.len() {
            return Err(MicrodomainError::MismatchedLengths {
                what: "voxel centers and mask labels",
                expected: centers.len(),
                found: labels.len(),
            });
        }
        Ok(ConnectedComponents::label(shape, dims, offset, |i| labels[i] != 0))
    }
}

fn grid_shape(shape: [i64; 3]) -> Result<[usize; 3]> {
    let mut out = [0usize; 3];
    for k in 0..3 {
        out[k] = usize::try_from(shape[k])
            .map_err(|_| MicrodomainError::InvalidConfig(format!("voxel grid shape {:?} has a negative axis", shape)))?;
    }
    Ok(out)
}

/// Voxel containing `point` in a grid of `shape` voxels, `None` outside.
fn grid_index(shape: [usize; 3], voxel_dimensions: [f64; 3], offset: [f64; 3], point: &[f64; 3]) -> Option<[usize; 3]> {
    let mut index = [0usize; 3];
    for k in 0..3 {
        let i = ((point[k] - offset[k]) / voxel_dimensions[k]).floor();
        if !(i >= 0.0 && i < shape[k] as f64) {
            return None;
        }
        index[k] = i as usize;
    }
    Some(index)
}

/// The 6-connected components of the inside voxels of a mask.
///
/// Components are numbered in x-fastest order of their first voxel.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectedComponents {
    shape: [usize; 3],
    voxel_dimensions: [f64; 3],
    offset: [f64; 3],
    /// Component of each voxel, x-fastest. `None` for background.
    components: Vec<Option<usize>>,
    /// Lowest and highest voxel index of each component.
    extents: Vec<[[usize; 3]; 2]>,
}

impl ConnectedComponents {
    fn label<F>(shape: [usize; 3], voxel_dimensions: [f64; 3], offset: [f64; 3], inside: F) -> Self
    where
        F: Fn(usize) -> bool,
    {
        let [nx, ny, nz] = shape;
        let strides = [1, nx, nx * ny];
        let mut components = vec![None; nx * ny * nz];
        let mut extents = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..components.len() {
            if components[start].is_some() || !inside(start) {
                continue;
            }

            // BFS over face neighbors
            let id = extents.len();
            let mut extent = [[usize::MAX; 3], [0; 3]];
            components[start] = Some(id);
            queue.push_back(start);

            while let Some(voxel) = queue.pop_front() {
                let index = [voxel % nx, (voxel / nx) % ny, voxel / (nx * ny)];
                for k in 0..3 {
                    extent[0][k] = extent[0][k].min(index[k]);
                    extent[1][k] = extent[1][k].max(index[k]);

                    let lower = (index[k] > 0).then(|| voxel - strides[k]);
                    let upper = (index[k] + 1 < shape[k]).then(|| voxel + strides[k]);
                    for neighbor in lower.into_iter().chain(upper) {
                        if components[neighbor].is_none() && inside(neighbor) {
                            components[neighbor] = Some(id);
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
            extents.push(extent);
        }

        Self { shape, voxel_dimensions, offset, components, extents }
    }

    pub fn len(&self) -> usize {
        self.extents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    /// Component of the voxel containing `point`, `None` on background or outside the grid.
    pub fn component_of(&self, point: &[f64; 3]) -> Option<usize> {
        let [x, y, z] = grid_index(self.shape, self.voxel_dimensions, self.offset, point)?;
        let [nx, ny, _] = self.shape;
        self.components[x + y * nx + z * nx * ny]
    }

    /// Box spanned by the voxels of `component`.
    pub fn bounding_box(&self, component: usize) -> Option<BoundingBox<3>> {
        let [lo, hi] = *self.extents.get(component)?;
        let shape = [0, 1, 2].map(|k| (hi[k] - lo[k] + 1) as i64);
        let offset = [0, 1, 2].map(|k| self.offset[k] + lo[k] as f64 * self.voxel_dimensions[k]);
        Some(BoundingBox::from_voxel_data(shape, self.voxel_dimensions, offset))
    }

    /// Generator indices of every component, in generator order.
    ///
    /// Components without generators get an empty list. A generator that is in no
    /// component is an error.
    pub fn partition(&self, positions: &[[f32; 3]]) -> Result<Vec<Vec<usize>>> {
        let mut groups = vec![Vec::new(); self.len()];
        for (i, position) in positions.iter().enumerate() {
            let component = self
                .component_of(&position.map(|c| c as f64))
                .ok_or(MicrodomainError::GeneratorOutsideRegion {
                    generator: GeneratorId(i),
                    position: *position,
                })?;
            groups[component].push(i);
        }
        Ok(groups)
    }
}

/// Dense label grid stored x-fastest: `index = x + y * nx + z * nx * ny`.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelMask {
    shape: [usize; 3],
    voxel_dimensions: [f64; 3],
    offset: [f64; 3],
    labels: Vec<i32>,
}

impl VoxelMask {
    pub fn new(shape: [usize; 3], voxel_dimensions: [f64; 3], offset: [f64; 3], labels: Vec<i32>) -> Result<Self> {
        let expected = shape.iter().product::<usize>();
        if labels.len() != expected {
            return Err(MicrodomainError::MismatchedLengths {
                what: "voxel mask shape and labels",
                expected,
                found: labels.len(),
            });
        }
        if voxel_dimensions.iter().any(|d| *d == 0.0 || !d.is_finite()) || !offset.iter().all(|o| o.is_finite()) {
            return Err(MicrodomainError::InvalidConfig(format!(
                "voxel mask needs finite, non-zero voxel dimensions, got {:?} at offset {:?}",
                voxel_dimensions, offset
            )));
        }
        Ok(Self { shape, voxel_dimensions, offset, labels })
    }

    /// Builds the grid by evaluating `label` at every voxel index.
    pub fn from_fn<F>(shape: [usize; 3], voxel_dimensions: [f64; 3], offset: [f64; 3], mut label: F) -> Result<Self>
    where
        F: FnMut([usize; 3]) -> i32,
    {
        let [nx, ny, nz] = shape;
        let mut labels = Vec::with_capacity(nx * ny * nz);
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    labels.push(label([x, y, z]));
                }
            }
        }
        Self::new(shape, voxel_dimensions, offset, labels)
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Voxel index of a position, `None` outside the grid.
    pub fn voxel_index(&self, point: &[f64; 3]) -> Option<[usize; 3]> {
        grid_index(self.shape, self.voxel_dimensions, self.offset, point)
    }
}

impl RegionMask for VoxelMask {
    fn shape(&self) -> [i64; 3] {
        self.shape.map(|s| s as i64)
    }

    fn voxel_dimensions(&self) -> [f64; 3] {
        self.voxel_dimensions
    }

    fn offset(&self) -> [f64; 3] {
        self.offset
    }

    fn lookup(&self, points: &[[f64; 3]], outer_value: i32) -> Result<Vec<i32>> {
        let [nx, ny, _] = self.shape;
        Ok(points
            .iter()
            .map(|p| match self.voxel_index(p) {
                Some([x, y, z]) => self.labels[x + y * nx + z * nx * ny],
                None => outer_value,
            })
            .collect())
    }

    fn connected_components(&self) -> Result<ConnectedComponents> {
        Ok(ConnectedComponents::label(self.shape, self.voxel_dimensions, self.offset, |i| {
            self.labels[i] != 0
        }))
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Projects the vertices of `cell` that fall outside the region onto the
/// sphere around `soma_position` whose radius is the distance to the closest
/// vertex. Topology is kept; a cell with every vertex inside is returned as is.
pub fn limit_microdomain_to_roi<M: RegionMask + ?Sized>(
    cell: Microdomain,
    soma_position: [f32; 3],
    region_mask: &M,
    bounding_box: &BoundingBox<3>,
) -> Result<Microdomain> {
    if cell.points().is_empty() {
        return Ok(cell);
    }

    // Kept in f64: at large coordinates `max - ROI_EPSILON` is not representable in f32
    let upper = bounding_box.max.map(|v| v - ROI_EPSILON);
    let clamped: Vec<[f64; 3]> = cell
        .points()
        .iter()
        .map(|p| [
            (p[0] as f64).min(upper[0]),
            (p[1] as f64).min(upper[1]),
            (p[2] as f64).min(upper[2]),
        ])
        .collect();

    let soma = soma_position.map(|c| c as f64);
    let radius = clamped
        .iter()
        .map(|p| distance(*p, soma))
        .fold(f64::INFINITY, f64::min);

    let labels = region_mask.lookup(&clamped, 0)?;
    if labels.len() != clamped.len() {
        return Err(MicrodomainError::MismatchedLengths {
            what: "microdomain points and mask labels",
            expected: clamped.len(),
            found: labels.len(),
        });
    }
    if labels.iter().all(|&l| l != 0) {
        return Ok(cell);
    }

    let mut points = cell.points().to_vec();
    for (point, _) in points.iter_mut().zip(&labels).filter(|(_, l)| **l == 0) {
        let p = point.map(|c| c as f64);
        let length = distance(p, soma);
        if length < MIN_PROJECTION_LENGTH {
            return Err(MicrodomainError::DegenerateProjection { point: *point });
        }
        let scale = radius / length;
        *point = [
            (soma[0] + (p[0] - soma[0]) * scale) as f32,
            (soma[1] + (p[1] - soma[1]) * scale) as f32,
            (soma[2] + (p[2] - soma[2]) * scale) as f32,
        ];
    }

    cell.with_points(points)
}

/// Lazy single-pass region limiting, see [`limit_microdomains_to_roi`].
pub struct RoiLimitedMicrodomains<'m, I, S, M: ?Sized> {
    cells: I,
    somata: S,
    region_mask: &'m M,
    bounding_box: BoundingBox<3>,
    count: usize,
    done: bool,
}

impl<I, S, M> Iterator for RoiLimitedMicrodomains<'_, I, S, M>
where
    I: Iterator<Item = Microdomain>,
    S: Iterator<Item = [f32; 3]>,
    M: RegionMask + ?Sized,
{
    type Item = Result<Microdomain>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match (self.cells.next(), self.somata.next()) {
            (Some(cell), Some(soma)) => {
                self.count += 1;
                let result = limit_microdomain_to_roi(cell, soma, self.region_mask, &self.bounding_box);
                self.done = result.is_err();
                Some(result)
            }
            (None, None) => {
                self.done = true;
                None
            }
            (cell, _) => {
                self.done = true;
                let (expected, found) = if cell.is_some() {
                    (self.count + 1, self.count)
                } else {
                    (self.count, self.count + 1)
                };
                Some(Err(MicrodomainError::MismatchedLengths {
                    what: "microdomains and soma positions",
                    expected,
                    found,
                }))
            }
        }
    }
}

/// Limits every microdomain to the region of `region_mask`, pairing cells
/// with soma positions in order.
///
/// Iteration stops after the first error.
pub fn limit_microdomains_to_roi<'m, I, S, M>(
    cells: I,
    soma_positions: S,
    region_mask: &'m M,
) -> RoiLimitedMicrodomains<'m, I::IntoIter, S::IntoIter, M>
where
    I: IntoIterator<Item = Microdomain>,
    S: IntoIterator<Item = [f32; 3]>,
    M: RegionMask + ?Sized,
{
    RoiLimitedMicrodomains {
        cells: cells.into_iter(),
        somata: soma_positions.into_iter(),
        bounding_box: region_mask.bounding_box(),
        region_mask,
        count: 0,
        done: false,
    }
}
