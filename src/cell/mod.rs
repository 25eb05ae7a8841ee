use std::fmt;
use std::sync::Arc;

use crate::error::{MicrodomainError, Result};

pub mod power;

/// Index of a generator point, which is also the index of its microdomain.
///
/// Kept apart from plain `usize`/`i64` so that generator indices do not get
/// mixed up with cell-local vertex indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneratorId(pub usize);

impl GeneratorId {
    /// Interprets a per-face neighbor value. Negative values are boundary sentinels.
    pub fn from_neighbor(value: i64) -> Option<Self> {
        if value >= 0 { Some(GeneratorId(value as usize)) } else { None }
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A triangulated convex polyhedron assigned to one generator.
///
/// `triangle_data` holds `(face_id, v0, v1, v2)` per triangle, where `face_id`
/// is the polygonal face of the Laguerre cell the triangle was cut from and
/// `v*` index into `points`. `neighbor_ids` holds, per triangle, the generator
/// on the other side of that face or a negative sentinel on the bounding box.
///
/// Transformations never mutate: they return a new microdomain with a fresh
/// point buffer that shares the topology buffers with the original.
#[derive(Clone, Debug, PartialEq)]
pub struct Microdomain {
    points: Vec<[f32; 3]>,
    triangle_data: Arc<[[i64; 4]]>,
    neighbor_ids: Arc<[i64]>,
}

impl Microdomain {
    /// Creates a microdomain, checking that there is one neighbor per triangle
    /// and that every triangle vertex exists.
    pub fn new(points: Vec<[f32; 3]>, triangle_data: Vec<[i64; 4]>, neighbor_ids: Vec<i64>) -> Result<Self> {
        if triangle_data.len() != neighbor_ids.len() {
            return Err(MicrodomainError::MismatchedLengths {
                what: "triangles and neighbor ids",
                expected: triangle_data.len(),
                found: neighbor_ids.len(),
            });
        }
        for row in &triangle_data {
            if let Some(&index) = row[1..].iter().find(|&&v| v < 0 || v as usize >= points.len()) {
                return Err(MicrodomainError::IndexOutOfBounds {
                    face: row[0].max(0) as usize,
                    index,
                    len: points.len(),
                });
            }
        }
        Ok(Self {
            points,
            triangle_data: triangle_data.into(),
            neighbor_ids: neighbor_ids.into(),
        })
    }

    /// A microdomain without geometry, produced for generators whose power cell is empty.
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            triangle_data: Vec::new().into(),
            neighbor_ids: Vec::new().into(),
        }
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    pub fn triangle_data(&self) -> &[[i64; 4]] {
        &self.triangle_data
    }

    pub fn neighbor_ids(&self) -> &[i64] {
        &self.neighbor_ids
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_data.is_empty()
    }

    /// Vertex indices of each triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.triangle_data
            .iter()
            .map(|row| [row[1] as usize, row[2] as usize, row[3] as usize])
    }

    /// Polygonal face each triangle belongs to.
    pub fn face_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.triangle_data.iter().map(|row| row[0])
    }

    /// Sorted, unique generators sharing a face with this microdomain.
    pub fn neighbors(&self) -> Vec<GeneratorId> {
        let mut ids: Vec<GeneratorId> = self
            .neighbor_ids
            .iter()
            .filter_map(|&n| GeneratorId::from_neighbor(n))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Same topology, different geometry. The point count must not change.
    pub fn with_points(&self, points: Vec<[f32; 3]>) -> Result<Self> {
        if points.len() != self.points.len() {
            return Err(MicrodomainError::MismatchedLengths {
                what: "microdomain points",
                expected: self.points.len(),
                found: points.len(),
            });
        }
        Ok(Self {
            points,
            triangle_data: Arc::clone(&self.triangle_data),
            neighbor_ids: Arc::clone(&self.neighbor_ids),
        })
    }

    /// Applies `f` to every point, keeping the topology.
    pub fn map_points<F>(&self, f: F) -> Self
    where
        F: FnMut([f32; 3]) -> [f32; 3],
    {
        Self {
            points: self.points.iter().copied().map(f).collect(),
            triangle_data: Arc::clone(&self.triangle_data),
            neighbor_ids: Arc::clone(&self.neighbor_ids),
        }
    }

    /// Rewrites every non-negative neighbor id through `f`. Box sides are kept.
    pub fn map_neighbors<F>(&self, mut f: F) -> Self
    where
        F: FnMut(GeneratorId) -> GeneratorId,
    {
        let neighbor_ids: Vec<i64> = self
            .neighbor_ids
            .iter()
            .map(|&n| match GeneratorId::from_neighbor(n) {
                Some(id) => f(id).0 as i64,
                None => n,
            })
            .collect();
        Self {
            points: self.points.clone(),
            triangle_data: Arc::clone(&self.triangle_data),
            neighbor_ids: neighbor_ids.into(),
        }
    }

    /// Uniform dilation about the centroid: `c + factor * (p - c)`.
    pub fn scale(&self, factor: f64) -> Self {
        let c = self.centroid();
        self.map_points(|p| {
            [
                (c[0] + factor * (p[0] as f64 - c[0])) as f32,
                (c[1] + factor * (p[1] as f64 - c[1])) as f32,
                (c[2] + factor * (p[2] as f64 - c[2])) as f32,
            ]
        })
    }

    /// Signed tetrahedron volumes (times 6) and their centroid sums, taken
    /// against the first vertex to keep the numbers small.
    fn volume_moments(&self) -> (f64, [f64; 3]) {
        let Some(origin) = self.points.first() else {
            return (0.0, [0.0; 3]);
        };
        let o = [origin[0] as f64, origin[1] as f64, origin[2] as f64];
        let rel = |i: usize| {
            let p = self.points[i];
            [p[0] as f64 - o[0], p[1] as f64 - o[1], p[2] as f64 - o[2]]
        };

        let mut total: f64 = 0.0;
        let mut moment = [0.0f64; 3];
        for [i0, i1, i2] in self.triangles() {
            let v0 = rel(i0);
            let v1 = rel(i1);
            let v2 = rel(i2);

            let cross_x = v1[1] * v2[2] - v1[2] * v2[1];
            let cross_y = v1[2] * v2[0] - v1[0] * v2[2];
            let cross_z = v1[0] * v2[1] - v1[1] * v2[0];
            let det = v0[0] * cross_x + v0[1] * cross_y + v0[2] * cross_z;

            total += det;
            for k in 0..3 {
                moment[k] += det * (v0[k] + v1[k] + v2[k]);
            }
        }
        (total, moment)
    }

    pub fn volume(&self) -> f64 {
        (self.volume_moments().0 / 6.0).abs()
    }

    /// Volume centroid. Falls back to the vertex mean for flat or empty cells.
    pub fn centroid(&self) -> [f64; 3] {
        if self.points.is_empty() {
            return [0.0; 3];
        }
        let (total, moment) = self.volume_moments();
        if total.abs() < 1e-12 {
            let n = self.points.len() as f64;
            let mut mean = [0.0; 3];
            for p in &self.points {
                for k in 0..3 {
                    mean[k] += p[k] as f64 / n;
                }
            }
            return mean;
        }
        let o = self.points[0];
        let factor = 1.0 / (4.0 * total);
        [
            o[0] as f64 + moment[0] * factor,
            o[1] as f64 + moment[1] * factor,
            o[2] as f64 + moment[2] * factor,
        ]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Axis-aligned box as a triangulated microdomain, outward oriented.
    pub(crate) fn box_microdomain(min: [f32; 3], max: [f32; 3]) -> Microdomain {
        let points = vec![
            [min[0], min[1], min[2]],
            [max[0], min[1], min[2]],
            [max[0], max[1], min[2]],
            [min[0], max[1], min[2]],
            [min[0], min[1], max[2]],
            [max[0], min[1], max[2]],
            [max[0], max[1], max[2]],
            [min[0], max[1], max[2]],
        ];
        let faces: [[i64; 4]; 6] = [
            [3, 2, 1, 0],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [0, 4, 7, 3],
            [1, 2, 6, 5],
        ];
        let mut triangle_data = Vec::new();
        let mut neighbor_ids = Vec::new();
        for (f, face) in faces.iter().enumerate() {
            triangle_data.push([f as i64, face[0], face[1], face[2]]);
            triangle_data.push([f as i64, face[0], face[2], face[3]]);
            neighbor_ids.push(f as i64 - 3);
            neighbor_ids.push(f as i64 - 3);
        }
        Microdomain::new(points, triangle_data, neighbor_ids).unwrap()
    }

    #[test]
    fn test_box_metrics() {
        let cell = box_microdomain([0.0, 0.0, 0.0], [10.0, 20.0, 30.0]);
        assert!((cell.volume() - 6000.0).abs() < 1e-6);
        let c = cell.centroid();
        assert!((c[0] - 5.0).abs() < 1e-6);
        assert!((c[1] - 10.0).abs() < 1e-6);
        assert!((c[2] - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_neighbors_unique_and_non_negative() {
        let cell = box_microdomain([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert_eq!(cell.neighbors(), vec![GeneratorId(0), GeneratorId(1), GeneratorId(2)]);
    }

    #[test]
    fn test_map_neighbors_keeps_box_sides() {
        let cell = box_microdomain([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let mapped = cell.map_neighbors(|id| GeneratorId(id.0 * 10 + 5));
        assert_eq!(mapped.neighbors(), vec![GeneratorId(5), GeneratorId(15), GeneratorId(25)]);
        assert_eq!(&mapped.neighbor_ids()[..6], &cell.neighbor_ids()[..6]);
        assert_eq!(mapped.points(), cell.points());
        assert_eq!(mapped.triangle_data(), cell.triangle_data());
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let points = vec![[0.0f32; 3]; 3];
        assert!(matches!(
            Microdomain::new(points.clone(), vec![[0, 0, 1, 2]], vec![]),
            Err(MicrodomainError::MismatchedLengths { .. })
        ));
        assert_eq!(
            Microdomain::new(points, vec![[0, 0, 1, 3]], vec![-1]),
            Err(MicrodomainError::IndexOutOfBounds { face: 0, index: 3, len: 3 })
        );
    }

    #[test]
    fn test_scale_about_centroid() {
        let cell = box_microdomain([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let scaled = cell.scale(2.0);

        assert!((scaled.volume() - 64.0).abs() < 1e-4);
        assert_eq!(scaled.points()[0], [-1.0, -1.0, -1.0]);
        assert_eq!(scaled.points()[6], [3.0, 3.0, 3.0]);
        assert_eq!(scaled.triangle_data(), cell.triangle_data());
        assert_eq!(scaled.neighbor_ids(), cell.neighbor_ids());
        // Original untouched
        assert_eq!(cell.points()[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_with_points_checks_count() {
        let cell = box_microdomain([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert!(cell.with_points(vec![[0.0; 3]; 7]).is_err());
        let moved = cell.with_points(vec![[1.0; 3]; 8]).unwrap();
        assert_eq!(moved.triangle_data(), cell.triangle_data());
    }

    #[test]
    fn test_empty() {
        let cell = Microdomain::empty();
        assert!(cell.is_empty());
        assert_eq!(cell.volume(), 0.0);
        assert_eq!(cell.scale(3.0), cell);
    }
}
