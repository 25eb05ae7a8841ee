use crate::bounds::BoundingBox;
use crate::cell::Microdomain;
use crate::config::MicrodomainConfigBuilder;
use crate::error::MicrodomainError;
use crate::pipeline::{MicrodomainSet, build_microdomains};
use crate::roi::VoxelMask;
use crate::scaling::scaling_factor_from_overlap;
use crate::solver::LaguerreSolver;
use crate::tessellation::TessellationGenerator;
use crate::wasm::chunk_points;
use wasm_bindgen::prelude::*;

// --- Bounding Box ---

/// Represents an axis-aligned bounding box in 3D space.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug)]
pub struct BoundingBox3D {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
}

#[wasm_bindgen]
impl BoundingBox3D {
    #[wasm_bindgen(constructor)]
    pub fn new(
        min_x: f64,
        min_y: f64,
        min_z: f64,
        max_x: f64,
        max_y: f64,
        max_z: f64,
    ) -> BoundingBox3D {
        BoundingBox3D {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }
}

impl From<BoundingBox3D> for BoundingBox<3> {
    fn from(b: BoundingBox3D) -> Self {
        Self {
            min: [b.min_x, b.min_y, b.min_z],
            max: [b.max_x, b.max_y, b.max_z],
        }
    }
}

fn generator_points(points: &[f32]) -> Result<Vec<[f32; 3]>, MicrodomainError> {
    chunk_points(points).ok_or_else(|| {
        MicrodomainError::InvalidConfig(format!(
            "generator coordinates must come in xyz triples, got {} values",
            points.len()
        ))
    })
}

// --- Microdomain Wrapper ---

#[wasm_bindgen(js_name = Microdomain)]
pub struct MicrodomainWASM {
    inner: Microdomain,
}

#[wasm_bindgen(js_class = Microdomain)]
impl MicrodomainWASM {
    /// Vertex coordinates as a flat `[x, y, z, ...]` buffer.
    #[wasm_bindgen(getter)]
    pub fn points(&self) -> Vec<f32> {
        self.inner.points().iter().flatten().copied().collect()
    }

    /// Flat `[face, v0, v1, v2, ...]` buffer, four entries per triangle.
    #[wasm_bindgen(getter, js_name = triangleData)]
    pub fn triangle_data(&self) -> Vec<i64> {
        self.inner.triangle_data().iter().flatten().copied().collect()
    }

    /// Neighbor of every triangle; negative values are box sides.
    #[wasm_bindgen(getter, js_name = neighborIds)]
    pub fn neighbor_ids(&self) -> Vec<i64> {
        self.inner.neighbor_ids().to_vec()
    }

    /// Unique neighboring generator indices.
    #[wasm_bindgen(getter)]
    pub fn neighbors(&self) -> Vec<usize> {
        self.inner.neighbors().into_iter().map(|g| g.index()).collect()
    }

    #[wasm_bindgen(getter, js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn volume(&self) -> f64 {
        self.inner.volume()
    }

    pub fn centroid(&self) -> Vec<f64> {
        self.inner.centroid().to_vec()
    }

    pub fn scale(&self, factor: f64) -> MicrodomainWASM {
        MicrodomainWASM { inner: self.inner.scale(factor) }
    }
}

impl MicrodomainWASM {
    pub fn inner(&self) -> &Microdomain {
        &self.inner
    }
}

fn wrap(cells: Vec<Microdomain>) -> Vec<MicrodomainWASM> {
    cells.into_iter().map(|inner| MicrodomainWASM { inner }).collect()
}

/// Laguerre tessellation of the spheres `points` (flat xyz) with `radii`.
#[wasm_bindgen(js_name = generateMicrodomains)]
pub fn generate_microdomains(
    points: &[f32],
    radii: &[f32],
    bounds: &BoundingBox3D,
    threads: usize,
) -> Result<Vec<MicrodomainWASM>, JsError> {
    let points = generator_points(points)?;
    let cells = TessellationGenerator::new(LaguerreSolver::new())
        .with_threads(threads)
        .generate(&points, radii, (*bounds).into())?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(wrap(cells))
}

#[wasm_bindgen(js_name = scalingFactorFromOverlap)]
pub fn scaling_factor_from_overlap_js(overlap_factor: f64) -> Result<f64, JsError> {
    Ok(scaling_factor_from_overlap(overlap_factor)?)
}

// --- Voxel Mask ---

#[wasm_bindgen(js_name = VoxelMask)]
pub struct VoxelMaskWASM {
    inner: VoxelMask,
}

#[wasm_bindgen(js_class = VoxelMask)]
impl VoxelMaskWASM {
    /// `shape`, `voxelDimensions` and `offset` are xyz triples, `labels` is x-fastest.
    #[wasm_bindgen(constructor)]
    pub fn new(shape: &[u32], voxel_dimensions: &[f64], offset: &[f64], labels: Vec<i32>) -> Result<VoxelMaskWASM, JsError> {
        let (Ok(shape), Ok(voxel_dimensions), Ok(offset)) = (
            <[u32; 3]>::try_from(shape),
            <[f64; 3]>::try_from(voxel_dimensions),
            <[f64; 3]>::try_from(offset),
        ) else {
            return Err(JsError::new("shape, voxelDimensions and offset need exactly 3 entries"));
        };
        let inner = VoxelMask::new(shape.map(|s| s as usize), voxel_dimensions, offset, labels)?;
        Ok(VoxelMaskWASM { inner })
    }
}

// --- Pipeline ---

#[wasm_bindgen(js_name = MicrodomainSet)]
pub struct MicrodomainSetWASM {
    inner: MicrodomainSet,
}

#[wasm_bindgen(js_class = MicrodomainSet)]
impl MicrodomainSetWASM {
    #[wasm_bindgen(getter)]
    pub fn microdomains(&self) -> Vec<MicrodomainWASM> {
        wrap(self.inner.microdomains.clone())
    }

    #[wasm_bindgen(getter)]
    pub fn overlapping(&self) -> Vec<MicrodomainWASM> {
        wrap(self.inner.overlapping.clone())
    }

    #[wasm_bindgen(getter, js_name = scalingFactors)]
    pub fn scaling_factors(&self) -> Vec<f64> {
        self.inner.scaling_factors.clone()
    }
}

#[wasm_bindgen(js_name = MicrodomainBuilder)]
pub struct MicrodomainBuilderWASM {
    builder: MicrodomainConfigBuilder,
    mask: Option<VoxelMask>,
}

#[wasm_bindgen(js_class = MicrodomainBuilder)]
impl MicrodomainBuilderWASM {
    #[wasm_bindgen(constructor)]
    pub fn new() -> MicrodomainBuilderWASM {
        MicrodomainBuilderWASM { builder: MicrodomainConfigBuilder::new(), mask: None }
    }

    pub fn overlap(&mut self, mean: f64, std: f64) -> Result<(), JsError> {
        self.builder = self.builder.clone().overlap(mean, std)?;
        Ok(())
    }

    pub fn seed(&mut self, seed: u64) {
        self.builder = self.builder.clone().seed(seed);
    }

    pub fn threads(&mut self, threads: usize) {
        self.builder = self.builder.clone().threads(threads);
    }

    #[wasm_bindgen(js_name = setMask)]
    pub fn set_mask(&mut self, mask: &VoxelMaskWASM) {
        self.mask = Some(mask.inner.clone());
    }

    #[wasm_bindgen(js_name = clearMask)]
    pub fn clear_mask(&mut self) {
        self.mask = None;
    }

    pub fn build(&self, points: &[f32], radii: &[f32], bounds: &BoundingBox3D) -> Result<MicrodomainSetWASM, JsError> {
        let config = self.builder.clone().build()?;
        let points = generator_points(points)?;
        let inner = build_microdomains(
            &config,
            LaguerreSolver::new(),
            &points,
            radii,
            (*bounds).into(),
            self.mask.as_ref(),
        )?;
        Ok(MicrodomainSetWASM { inner })
    }
}

impl Default for MicrodomainBuilderWASM {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: [f32; 6] = [1.0, 1.0, 1.0, 3.0, 1.0, 1.0];

    #[test]
    fn test_generate_microdomains() {
        let bounds = BoundingBox3D::new(0.0, 0.0, 0.0, 4.0, 2.0, 2.0);
        let cells = generate_microdomains(&POINTS, &[0.5, 0.5], &bounds, 1).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].neighbors(), vec![1]);
        assert_eq!(cells[0].points().len(), cells[0].inner().points().len() * 3);
        assert_eq!(cells[0].triangle_data().len(), cells[0].neighbor_ids().len() * 4);
        assert!((cells[0].volume() - 8.0).abs() < 1e-4);
        assert!(!cells[1].is_empty());
    }

    #[test]
    fn test_generator_points_need_triples() {
        assert_eq!(generator_points(&POINTS).unwrap(), vec![[1.0, 1.0, 1.0], [3.0, 1.0, 1.0]]);
        assert!(matches!(generator_points(&[1.0, 2.0]), Err(MicrodomainError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_with_mask() {
        let bounds = BoundingBox3D::new(0.0, 0.0, 0.0, 4.0, 2.0, 2.0);
        let mask = VoxelMaskWASM::new(&[4, 2, 2], &[1.0; 3], &[0.0; 3], vec![1; 16]).unwrap();
        let mut builder = MicrodomainBuilderWASM::new();
        builder.overlap(0.2, 0.0).unwrap();
        builder.seed(5);
        builder.set_mask(&mask);
        let set = builder.build(&POINTS, &[0.5, 0.5], &bounds).unwrap();
        assert_eq!(set.microdomains().len(), 2);
        assert_eq!(set.overlapping().len(), 2);
        let expected = scaling_factor_from_overlap(0.2).unwrap();
        assert!(set.scaling_factors().iter().all(|s| (s - expected).abs() < 1e-12));
    }
}
