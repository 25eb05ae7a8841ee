use crate::bounds::BoundingBox;
use crate::bounds::{BOX_ID_BACK, BOX_ID_BOTTOM, BOX_ID_FRONT, BOX_ID_LEFT, BOX_ID_RIGHT, BOX_ID_TOP};

/// Scratch buffer to reuse allocations during clipping.
#[derive(Default, Clone)]
pub struct PowerCellScratch {
    vertices: Vec<[f64; 3]>,
    face_counts: Vec<u32>,
    face_indices: Vec<u32>,
    face_neighbors: Vec<i64>,
    dists: Vec<f64>,
    is_intersection: Vec<bool>,
    old_to_new: Vec<Option<u32>>,
    intersection_map: Vec<(u64, u32)>,
    lid_segments: Vec<(u32, u32)>,
    face_buffer: Vec<u32>,
    lid_buffer: Vec<u32>,
    lid_map: Vec<u32>,
}

impl PowerCellScratch {
    /// Returns the vertex on edge `(a, b)` where the plane crosses it, creating
    /// it on first use so that both faces sharing the edge get the same index.
    fn edge_crossing(&mut self, cell: &PowerCell, a: usize, b: usize) -> u32 {
        let key = if a < b { (a as u64) << 32 | b as u64 } else { (b as u64) << 32 | a as u64 };
        if let Some(&(_, idx)) = self.intersection_map.iter().find(|&&(k, _)| k == key) {
            return idx;
        }
        let d_a = self.dists[a];
        let d_b = self.dists[b];
        let t = (d_a / (d_a - d_b)).clamp(0.0, 1.0);
        let pa = cell.vertices[a];
        let pb = cell.vertices[b];
        let idx = self.vertices.len() as u32;
        self.vertices.push([
            pa[0] + t * (pb[0] - pa[0]),
            pa[1] + t * (pb[1] - pa[1]),
            pa[2] + t * (pb[2] - pa[2]),
        ]);
        self.is_intersection.push(true);
        self.intersection_map.push((key, idx));
        idx
    }
}

/// A convex polyhedron cut out of the bounding box by power bisector planes.
///
/// Faces are stored as loops of vertex indices with one neighbor id per face:
/// the generator behind the face, or one of the negative box side ids.
#[derive(Clone, Debug)]
pub struct PowerCell {
    pub(crate) id: usize,
    pub(crate) generator: [f64; 3],
    pub(crate) vertices: Vec<[f64; 3]>,
    // Number of vertices for each face
    pub(crate) face_counts: Vec<u32>,
    // Flattened indices for all faces
    pub(crate) face_indices: Vec<u32>,
    pub(crate) face_neighbors: Vec<i64>,
    tolerance: f64,
}

impl PowerCell {
    /// Starts the cell of generator `id` as the full bounding box.
    pub fn new(id: usize, generator: [f64; 3], bounds: &BoundingBox<3>) -> PowerCell {
        let [min_x, min_y, min_z] = bounds.min;
        let [max_x, max_y, max_z] = bounds.max;
        let vertices = vec![
            [min_x, min_y, min_z], // 0
            [max_x, min_y, min_z], // 1
            [max_x, max_y, min_z], // 2
            [min_x, max_y, min_z], // 3
            [min_x, min_y, max_z], // 4
            [max_x, min_y, max_z], // 5
            [max_x, max_y, max_z], // 6
            [min_x, max_y, max_z], // 7
        ];

        let face_indices: Vec<u32> = vec![
            3, 2, 1, 0, // Bottom (z-)
            4, 5, 6, 7, // Top (z+)
            0, 1, 5, 4, // Front (y-)
            2, 3, 7, 6, // Back (y+)
            0, 4, 7, 3, // Left (x-)
            1, 2, 6, 5, // Right (x+)
        ];

        let extent = bounds.extent().iter().fold(1.0f64, |acc, &e| acc.max(e.abs()));

        PowerCell {
            id,
            generator,
            vertices,
            face_counts: vec![4; 6],
            face_indices,
            face_neighbors: vec![BOX_ID_BOTTOM, BOX_ID_TOP, BOX_ID_FRONT, BOX_ID_BACK, BOX_ID_LEFT, BOX_ID_RIGHT],
            tolerance: 1e-10 * extent,
        }
    }

    /// The ID of the generator associated with this cell.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Removes all geometry, for generators dominated by a coincident heavier one.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.face_counts.clear();
        self.face_indices.clear();
        self.face_neighbors.clear();
    }

    pub fn faces(&self) -> Vec<Vec<usize>> {
        let mut faces: Vec<Vec<usize>> = Vec::with_capacity(self.face_counts.len());
        let mut offset: usize = 0;
        for &count in &self.face_counts {
            let count = count as usize;
            faces.push(self.face_indices[offset..offset + count].iter().map(|&i| i as usize).collect());
            offset += count;
        }
        faces
    }

    /// Flat `[count, v_0, .., v_{count-1}, count, ..]` encoding of the faces.
    pub fn face_vertex_buffer(&self) -> Vec<i64> {
        let mut flat = Vec::with_capacity(self.face_counts.len() + self.face_indices.len());
        let mut offset: usize = 0;
        for &count in &self.face_counts {
            let count = count as usize;
            flat.push(count as i64);
            flat.extend(self.face_indices[offset..offset + count].iter().map(|&i| i as i64));
            offset += count;
        }
        flat
    }

    pub fn volume(&self) -> f64 {
        let mut volume: f64 = 0.0;
        for face in self.faces() {
            if face.len() < 3 {
                continue;
            }
            // Fan triangulation around the first vertex of the face
            let v0 = self.vertices[face[0]];
            for pair in face[1..].windows(2) {
                let v1 = self.vertices[pair[0]];
                let v2 = self.vertices[pair[1]];
                volume += v0[0] * (v1[1] * v2[2] - v1[2] * v2[1])
                    + v0[1] * (v1[2] * v2[0] - v1[0] * v2[2])
                    + v0[2] * (v1[0] * v2[1] - v1[1] * v2[0]);
            }
        }
        (volume / 6.0).abs()
    }

    /// Squared distance from the generator to the furthest vertex.
    pub fn max_radius_sq(&self) -> f64 {
        let g = self.generator;
        self.vertices
            .iter()
            .map(|v| {
                let dx = v[0] - g[0];
                let dy = v[1] - g[1];
                let dz = v[2] - g[2];
                dx * dx + dy * dy + dz * dz
            })
            .fold(0.0, f64::max)
    }

    /// Keeps the half-space `(x - point) · normal <= 0`, closing the cut with a
    /// new face that carries `neighbor_id`.
    ///
    /// Returns `None` if the plane misses the cell, otherwise the new squared
    /// max radius (0 once the cell is gone).
    pub fn clip(&mut self, point: &[f64; 3], normal: &[f64; 3], neighbor_id: i64, scratch: &mut PowerCellScratch) -> Option<f64> {
        let eps = self.tolerance;
        scratch.dists.clear();
        scratch.dists.reserve(self.vertices.len());
        let mut all_inside = true;
        let mut all_outside = true;

        // 1. Signed distances
        for v in &self.vertices {
            let d = (v[0] - point[0]) * normal[0] + (v[1] - point[1]) * normal[1] + (v[2] - point[2]) * normal[2];
            scratch.dists.push(d);
            if d > eps {
                all_inside = false;
            } else if d < -eps {
                all_outside = false;
            }
        }

        if all_inside {
            return None;
        }
        if all_outside {
            self.clear();
            return Some(0.0);
        }

        // 2. Surviving vertices
        scratch.vertices.clear();
        scratch.face_counts.clear();
        scratch.face_indices.clear();
        scratch.face_neighbors.clear();
        scratch.is_intersection.clear();
        scratch.old_to_new.clear();
        scratch.old_to_new.resize(self.vertices.len(), None);
        scratch.intersection_map.clear();
        scratch.lid_segments.clear();
        scratch.lid_map.clear();

        for (i, v) in self.vertices.iter().enumerate() {
            if scratch.dists[i] <= eps {
                scratch.old_to_new[i] = Some(scratch.vertices.len() as u32);
                scratch.vertices.push(*v);
                // Vertices on the plane become corners of the lid
                scratch.is_intersection.push(scratch.dists[i] >= -eps);
            }
        }

        // 3. Clip each face
        let mut offset = 0;
        for (face_idx, &count) in self.face_counts.iter().enumerate() {
            let count = count as usize;
            let face_neighbor = self.face_neighbors[face_idx];
            scratch.face_buffer.clear();

            for i in 0..count {
                let s = self.face_indices[offset + i] as usize;
                let e = self.face_indices[offset + (i + 1) % count] as usize;
                let s_in = scratch.dists[s] <= eps;
                let e_in = scratch.dists[e] <= eps;

                match (s_in, e_in) {
                    (true, true) => scratch.face_buffer.extend(scratch.old_to_new[e]),
                    (true, false) => {
                        if scratch.dists[s] < -eps {
                            let idx = scratch.edge_crossing(self, s, e);
                            scratch.face_buffer.push(idx);
                        }
                    }
                    (false, true) => {
                        if scratch.dists[e] < -eps {
                            let idx = scratch.edge_crossing(self, s, e);
                            scratch.face_buffer.push(idx);
                        }
                        scratch.face_buffer.extend(scratch.old_to_new[e]);
                    }
                    (false, false) => {}
                }
            }
            offset += count;

            if scratch.face_buffer.len() >= 3 {
                scratch.face_counts.push(scratch.face_buffer.len() as u32);
                scratch.face_neighbors.push(face_neighbor);

                // The segment between two crossings lies on the cutting plane
                let n = scratch.face_buffer.len();
                for i in 0..n {
                    let u = scratch.face_buffer[i];
                    let v = scratch.face_buffer[(i + 1) % n];
                    if scratch.is_intersection[u as usize] && scratch.is_intersection[v as usize] {
                        scratch.lid_segments.push((v, u)); // Reverse order for the lid face
                    }
                }
                scratch.face_indices.extend_from_slice(&scratch.face_buffer);
            }
        }

        // 4. Close the cut with the lid face
        if let Some(&(start, next)) = scratch.lid_segments.first() {
            scratch.lid_buffer.clear();
            scratch.lid_map.resize(scratch.vertices.len(), u32::MAX);
            for &(u, v) in &scratch.lid_segments {
                scratch.lid_map[u as usize] = v;
            }

            scratch.lid_buffer.push(start);
            let mut current = next;
            while current != start && current != u32::MAX && scratch.lid_buffer.len() <= scratch.lid_segments.len() {
                scratch.lid_buffer.push(current);
                current = scratch.lid_map[current as usize];
            }

            if scratch.lid_buffer.len() >= 3 {
                scratch.face_counts.push(scratch.lid_buffer.len() as u32);
                scratch.face_indices.extend_from_slice(&scratch.lid_buffer);
                scratch.face_neighbors.push(neighbor_id);
            }
        }

        std::mem::swap(&mut self.vertices, &mut scratch.vertices);
        std::mem::swap(&mut self.face_counts, &mut scratch.face_counts);
        std::mem::swap(&mut self.face_indices, &mut scratch.face_indices);
        std::mem::swap(&mut self.face_neighbors, &mut scratch.face_neighbors);

        if self.face_counts.len() < 4 {
            // Sliver below tolerance, nothing of volume left
            self.clear();
            return Some(0.0);
        }
        Some(self.max_radius_sq())
    }
}
