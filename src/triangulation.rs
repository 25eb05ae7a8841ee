//! Decomposition of convex polygonal faces into triangles.

use crate::error::{MicrodomainError, Result};

/// Splits a flat face-vertex buffer `[count, v_0, .., v_{count-1}, count, ..]`
/// into one vertex loop per face.
pub fn split_face_loops(flat: &[i64]) -> Result<Vec<Vec<i64>>> {
    let mut faces: Vec<Vec<i64>> = Vec::new();
    let mut offset: usize = 0;
    while offset < flat.len() {
        let face = faces.len();
        let count = flat[offset];
        if count < 0 {
            return Err(MicrodomainError::MalformedFace { face, len: 0 });
        }
        let count = count as usize;
        let start = offset + 1;
        let end = start + count;
        if end > flat.len() {
            return Err(MicrodomainError::MalformedFace { face, len: flat.len() - start });
        }
        faces.push(flat[start..end].to_vec());
        offset = end;
    }
    Ok(faces)
}

/// Fan triangulation of convex faces.
///
/// A face `[i0, i1, .., ik]` yields `(i0, i1, i2), (i0, i2, i3), .., (i0, i_{k-1}, i_k)`,
/// every triangle tagged with the index of its face. Returns the triangles and
/// the parallel face-id list.
///
/// Fails on faces with fewer than 3 vertices or vertex indices outside of `points`;
/// both mean the upstream tessellation is broken.
pub fn polygons_to_triangles<P>(points: &[P], face_loops: &[Vec<i64>]) -> Result<(Vec<[i64; 3]>, Vec<i64>)> {
    let n_triangles: usize = face_loops.iter().map(|f| f.len().saturating_sub(2)).sum();
    let mut triangles: Vec<[i64; 3]> = Vec::with_capacity(n_triangles);
    let mut face_ids: Vec<i64> = Vec::with_capacity(n_triangles);

    for (face, indices) in face_loops.iter().enumerate() {
        if indices.len() < 3 {
            return Err(MicrodomainError::MalformedFace { face, len: indices.len() });
        }
        if let Some(&index) = indices.iter().find(|&&i| i < 0 || i as usize >= points.len()) {
            return Err(MicrodomainError::IndexOutOfBounds { face, index, len: points.len() });
        }

        let pivot = indices[0];
        for pair in indices[1..].windows(2) {
            triangles.push([pivot, pair[0], pair[1]]);
            face_ids.push(face as i64);
        }
    }

    Ok((triangles, face_ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_area(p: &[[f64; 3]], t: &[i64; 3]) -> f64 {
        let a = p[t[0] as usize];
        let b = p[t[1] as usize];
        let c = p[t[2] as usize];
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let cx = u[1] * v[2] - u[2] * v[1];
        let cy = u[2] * v[0] - u[0] * v[2];
        let cz = u[0] * v[1] - u[1] * v[0];
        0.5 * (cx * cx + cy * cy + cz * cz).sqrt()
    }

    #[test]
    fn test_split_face_loops() {
        let flat = [3, 0, 1, 2, 4, 0, 2, 3, 4];
        let faces = split_face_loops(&flat).unwrap();
        assert_eq!(faces, vec![vec![0, 1, 2], vec![0, 2, 3, 4]]);
    }

    #[test]
    fn test_split_truncated_buffer() {
        let flat = [3, 0, 1, 2, 4, 0, 2];
        assert_eq!(
            split_face_loops(&flat),
            Err(MicrodomainError::MalformedFace { face: 1, len: 2 })
        );
    }

    #[test]
    fn test_single_triangle_face() {
        let points = [[0.0f64; 3]; 3];
        let (triangles, face_ids) = polygons_to_triangles(&points, &[vec![2, 0, 1]]).unwrap();
        assert_eq!(triangles, vec![[2, 0, 1]]);
        assert_eq!(face_ids, vec![0]);
    }

    #[test]
    fn test_regular_polygon_fan() {
        // Regular hexagon in the z = 1 plane.
        let k = 6;
        let points: Vec<[f64; 3]> = (0..k)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / k as f64;
                [a.cos(), a.sin(), 1.0]
            })
            .collect();
        let face: Vec<i64> = (0..k as i64).collect();
        let faces = vec![vec![0, 1, 2], face];

        let (triangles, face_ids) = polygons_to_triangles(&points, &faces).unwrap();
        assert_eq!(triangles.len(), 1 + (k - 2));
        assert_eq!(face_ids[0], 0);
        assert!(face_ids[1..].iter().all(|&f| f == 1));
        assert_eq!(triangles[1], [0, 1, 2]);
        assert_eq!(triangles[4], [0, 4, 5]);

        let area: f64 = triangles[1..].iter().map(|t| triangle_area(&points, t)).sum();
        let expected = 1.5 * 3.0f64.sqrt();
        assert!((area - expected).abs() < 1e-12, "Expected area {}, got {}", expected, area);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let points = [[0.0f32; 3]; 4];
        let result = polygons_to_triangles(&points, &[vec![0, 1, 2], vec![0, 3, 7]]);
        assert_eq!(result, Err(MicrodomainError::IndexOutOfBounds { face: 1, index: 7, len: 4 }));
    }

    #[test]
    fn test_degenerate_face_rejected() {
        let points = [[0.0f32; 3]; 4];
        let result = polygons_to_triangles(&points, &[vec![0, 1]]);
        assert_eq!(result, Err(MicrodomainError::MalformedFace { face: 0, len: 2 }));
    }
}
