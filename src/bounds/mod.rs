use std::ops::Add;

/// Bounding box ID for the lower x face, it is negative to prevent conflicts with generator IDs.
pub const BOX_ID_LEFT: i64 = -1;
/// Bounding box ID for the upper x face, it is negative to prevent conflicts with generator IDs.
pub const BOX_ID_RIGHT: i64 = -2;
/// Bounding box ID for the lower y face, it is negative to prevent conflicts with generator IDs.
pub const BOX_ID_FRONT: i64 = -3;
/// Bounding box ID for the upper y face, it is negative to prevent conflicts with generator IDs.
pub const BOX_ID_BACK: i64 = -4;
/// Bounding box ID for the lower z face, it is negative to prevent conflicts with generator IDs.
pub const BOX_ID_BOTTOM: i64 = -5;
/// Bounding box ID for the upper z face, it is negative to prevent conflicts with generator IDs.
pub const BOX_ID_TOP: i64 = -6;

/// Generic axis-aligned bounding box for N-dimensional space.
///
/// Construction through the helpers below always yields `min[i] <= max[i]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// Returns `(min_point, max_point)`.
    pub fn ranges(&self) -> ([f64; D], [f64; D]) {
        (self.min, self.max)
    }

    /// Bounding box of a voxel grid.
    ///
    /// Voxel dimensions may be negative on any axis (the grid is stored in
    /// decreasing spatial order along it), so each bound is the min/max of
    /// `offset` and `offset + dim * shape` rather than the pair taken as is.
    pub fn from_voxel_data(shape: [i64; D], voxel_dimensions: [f64; D], offset: [f64; D]) -> Self {
        let mut min = [0.0; D];
        let mut max = [0.0; D];
        for i in 0..D {
            let far = offset[i] + voxel_dimensions[i] * shape[i] as f64;
            min[i] = offset[i].min(far);
            max[i] = offset[i].max(far);
        }
        Self { min, max }
    }

    /// Tight bound of all spheres, i.e. `center ± radius` over every sphere.
    ///
    /// An empty input yields an inverted box (`+inf` minima, `-inf` maxima),
    /// which is the identity of the `+` union.
    pub fn from_spheres(centers: &[[f32; D]], radii: &[f32]) -> Self {
        let mut min = [f64::INFINITY; D];
        let mut max = [f64::NEG_INFINITY; D];
        for (center, &radius) in centers.iter().zip(radii) {
            let radius = radius as f64;
            for i in 0..D {
                let c = center[i] as f64;
                min[i] = min[i].min(c - radius);
                max[i] = max[i].max(c + radius);
            }
        }
        Self { min, max }
    }

    /// Checks whether the sphere lies entirely inside the box (touching the walls is allowed).
    pub fn contains_sphere(&self, center: &[f64; D], radius: f64) -> bool {
        (0..D).all(|i| center[i] - radius >= self.min[i] && center[i] + radius <= self.max[i])
    }

    /// Clamps every component of the point into `[min, max]`.
    pub fn clamp(&self, point: [f64; D]) -> [f64; D] {
        let mut out = point;
        for i in 0..D {
            out[i] = out[i].max(self.min[i]).min(self.max[i]);
        }
        out
    }

    /// Extent of the box along each axis.
    pub fn extent(&self) -> [f64; D] {
        let mut out = [0.0; D];
        for i in 0..D {
            out[i] = self.max[i] - self.min[i];
        }
        out
    }

    pub fn volume(&self) -> f64 {
        self.extent().iter().product()
    }
}

/// Union bound: component-wise min of minima and max of maxima.
impl<const D: usize> Add for BoundingBox<D> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut min = self.min;
        let mut max = self.max;
        for i in 0..D {
            min[i] = min[i].min(other.min[i]);
            max[i] = max[i].max(other.max[i]);
        }
        Self { min, max }
    }
}

/// Calculates the ID for a bounding box wall based on the axis and direction.
///
/// The IDs start at -1 and decrease.
/// - Axis 0 (X) Min: -1
/// - Axis 0 (X) Max: -2
/// - Axis 1 (Y) Min: -3
/// - Axis 1 (Y) Max: -4
pub fn box_side(axis: usize, is_max: bool) -> i64 {
    -1 - (axis * 2 + if is_max { 1 } else { 0 }) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voxel_data_negative_dimensions() {
        let bbox = BoundingBox::from_voxel_data([2, 2, 2], [-1.0, 1.0, -1.0], [5.0, 0.0, 5.0]);
        assert_eq!(bbox.min, [3.0, 0.0, 3.0]);
        assert_eq!(bbox.max, [5.0, 2.0, 5.0]);
    }

    #[test]
    fn test_voxel_data_positive_dimensions() {
        let bbox = BoundingBox::from_voxel_data([10, 20, 5], [2.0, 0.5, 1.0], [-1.0, 0.0, 3.0]);
        assert_eq!(bbox.ranges(), ([-1.0, 0.0, 3.0], [19.0, 10.0, 8.0]));
    }

    #[test]
    fn test_from_spheres() {
        let centers = [[0.0f32, 0.0, 0.0], [10.0, 5.0, -2.0]];
        let radii = [1.0f32, 2.0];
        let bbox = BoundingBox::from_spheres(&centers, &radii);
        assert_eq!(bbox.min, [-1.0, -1.0, -4.0]);
        assert_eq!(bbox.max, [12.0, 7.0, 1.0]);
    }

    #[test]
    fn test_union_commutative_and_idempotent() {
        let a = BoundingBox::new([0.0, 0.0, 0.0], [1.0, 2.0, 3.0]);
        let b = BoundingBox::new([-1.0, 0.5, 1.0], [0.5, 4.0, 2.0]);
        assert_eq!(a + b, b + a);
        assert_eq!(a + a, a);
        assert_eq!(a + b, BoundingBox::new([-1.0, 0.0, 0.0], [1.0, 4.0, 3.0]));
    }

    #[test]
    fn test_empty_spheres_is_union_identity() {
        let a = BoundingBox::new([0.0, 0.0, 0.0], [1.0, 2.0, 3.0]);
        let empty = BoundingBox::<3>::from_spheres(&[], &[]);
        assert_eq!(empty + a, a);
    }

    #[test]
    fn test_contains_and_clamp() {
        let bbox = BoundingBox::new([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        assert!(bbox.contains_sphere(&[5.0, 5.0, 5.0], 5.0));
        assert!(!bbox.contains_sphere(&[5.0, 5.0, 9.0], 2.0));
        assert_eq!(bbox.clamp([-1.0, 5.0, 12.0]), [0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_box_side_ids() {
        assert_eq!(box_side(0, false), BOX_ID_LEFT);
        assert_eq!(box_side(0, true), BOX_ID_RIGHT);
        assert_eq!(box_side(1, false), BOX_ID_FRONT);
        assert_eq!(box_side(1, true), BOX_ID_BACK);
        assert_eq!(box_side(2, false), BOX_ID_BOTTOM);
        assert_eq!(box_side(2, true), BOX_ID_TOP);
    }
}
