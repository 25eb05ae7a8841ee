//! Inflation of microdomains to a target overlap.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

use crate::bounds::BoundingBox;
use crate::cell::Microdomain;
use crate::error::{MicrodomainError, Result};

/// Imaginary parts below this (relative to the root magnitude) count as real.
const IMAGINARY_TOLERANCE: f64 = 1e-9;

/// Roots of `a x³ + b x² + c x + d` as `(re, im)` pairs, by Cardano's method.
///
/// Returns `None` when the leading coefficient vanishes or an input is not finite.
pub fn cubic_roots(a: f64, b: f64, c: f64, d: f64) -> Option<[(f64, f64); 3]> {
    if ![a, b, c, d].iter().all(|v| v.is_finite()) || a.abs() < f64::EPSILON {
        return None;
    }
    let (b, c, d) = (b / a, c / a, d / a);

    // Depressed cubic t³ + p t + q with x = t - b / 3
    let shift = b / 3.0;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let disc = (q / 2.0).powi(2) + (p / 3.0).powi(3);

    if p == 0.0 && q == 0.0 {
        // Triple root
        return Some([(-shift, 0.0); 3]);
    }

    if disc == 0.0 {
        // Simple root and double root
        let single = 3.0 * q / p;
        let double = -3.0 * q / (2.0 * p);
        return Some([(single - shift, 0.0), (double - shift, 0.0), (double - shift, 0.0)]);
    }

    if disc > 0.0 {
        // One real root. The larger cube root avoids cancellation, the other follows from u v = -p / 3
        let h = -q / 2.0;
        let u = (h + h.signum() * disc.sqrt()).cbrt();
        let v = if u == 0.0 { 0.0 } else { -p / (3.0 * u) };
        let re = -(u + v) / 2.0 - shift;
        let im = (u - v) * 3.0f64.sqrt() / 2.0;
        return Some([(u + v - shift, 0.0), (re, im), (re, -im)]);
    }

    // Three distinct real roots
    let m = 2.0 * (-p / 3.0).sqrt();
    let theta = ((3.0 * q / (p * m)).clamp(-1.0, 1.0)).acos() / 3.0;
    let tau = std::f64::consts::TAU / 3.0;
    Some([
        (m * theta.cos() - shift, 0.0),
        (m * (theta - tau).cos() - shift, 0.0),
        (m * (theta - 2.0 * tau).cos() - shift, 0.0),
    ])
}

/// Uniform scaling factor that makes a microdomain overlap its neighbors by
/// the fraction `overlap_factor` of its volume.
///
/// Solves `s³ (2 - a) - 6 s² + 12 s - 8 = 0` for the real root, which exists
/// once for every `a` in `[0, 2)`. Among roots with negligible imaginary part
/// the one with the smallest residual wins.
pub fn scaling_factor_from_overlap(overlap_factor: f64) -> Result<f64> {
    if !(0.0..2.0).contains(&overlap_factor) {
        return Err(MicrodomainError::InvalidOverlapRange(overlap_factor));
    }

    let (a, b, c, d) = (2.0 - overlap_factor, -6.0, 12.0, -8.0);
    let residual = |s: f64| (((a * s + b) * s + c) * s + d).abs();

    cubic_roots(a, b, c, d)
        .into_iter()
        .flatten()
        .filter(|&(re, im)| im.abs() <= IMAGINARY_TOLERANCE * re.abs().max(1.0))
        .map(|(re, _)| re)
        .min_by(|x, y| residual(*x).total_cmp(&residual(*y)))
        .ok_or(MicrodomainError::NoRealRootFound { overlap: overlap_factor })
}

/// Normal distribution of overlap factors, one sample per microdomain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapDistribution {
    pub mean: f64,
    pub std: f64,
}

impl OverlapDistribution {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// Draws `count` overlap factors.
    pub fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<f64>> {
        let normal = Normal::new(self.mean, self.std).map_err(|e| {
            MicrodomainError::InvalidConfig(format!("overlap distribution ({}, {}): {}", self.mean, self.std, e))
        })?;
        Ok(normal.sample_iter(rng).take(count).collect())
    }

    /// Draws `count` overlap factors and converts each into a scaling factor.
    pub fn sample_scaling_factors<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<f64>> {
        self.sample(count, rng)?
            .into_iter()
            .map(scaling_factor_from_overlap)
            .collect()
    }
}

fn scale_and_clamp(cell: &Microdomain, factor: f64, bounds: &BoundingBox<3>) -> Microdomain {
    let lo = bounds.min.map(|v| v as f32);
    let hi = bounds.max.map(|v| v as f32);
    cell.scale(factor)
        .map_points(|p| [p[0].max(lo[0]).min(hi[0]), p[1].max(lo[1]).min(hi[1]), p[2].max(lo[2]).min(hi[2])])
}

/// Lazy single-pass scaling of microdomains, see [`scale_microdomains`].
pub struct ScaledMicrodomains<I, F> {
    cells: I,
    factors: F,
    bounds: BoundingBox<3>,
    count: usize,
    done: bool,
}

impl<I, F> Iterator for ScaledMicrodomains<I, F>
where
    I: Iterator<Item = Microdomain>,
    F: Iterator<Item = f64>,
{
    type Item = Result<Microdomain>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match (self.cells.next(), self.factors.next()) {
            (Some(cell), Some(factor)) => {
                self.count += 1;
                Some(Ok(scale_and_clamp(&cell, factor, &self.bounds)))
            }
            (None, None) => {
                self.done = true;
                None
            }
            (cell, _) => {
                // One sequence ran out first; the counts are those seen so far
                self.done = true;
                let (expected, found) = if cell.is_some() {
                    (self.count + 1, self.count)
                } else {
                    (self.count, self.count + 1)
                };
                Some(Err(MicrodomainError::MismatchedLengths {
                    what: "microdomains and scaling factors",
                    expected,
                    found,
                }))
            }
        }
    }
}

/// Dilates each microdomain about its centroid by its factor and clamps the
/// result into `bounding_box`.
///
/// Sequences of different lengths yield a final `MismatchedLengths` error.
pub fn scale_microdomains<I, F>(cells: I, scaling_factors: F, bounding_box: BoundingBox<3>) -> ScaledMicrodomains<I::IntoIter, F::IntoIter>
where
    I: IntoIterator<Item = Microdomain>,
    F: IntoIterator<Item = f64>,
{
    ScaledMicrodomains {
        cells: cells.into_iter(),
        factors: scaling_factors.into_iter(),
        bounds: bounding_box,
        count: 0,
        done: false,
    }
}

/// Parallel counterpart of [`scale_microdomains`] over materialized slices.
pub fn scale_microdomains_par(cells: &[Microdomain], scaling_factors: &[f64], bounding_box: BoundingBox<3>) -> Result<Vec<Microdomain>> {
    if cells.len() != scaling_factors.len() {
        return Err(MicrodomainError::MismatchedLengths {
            what: "microdomains and scaling factors",
            expected: cells.len(),
            found: scaling_factors.len(),
        });
    }
    Ok(cells
        .par_iter()
        .zip(scaling_factors.par_iter())
        .map(|(cell, &factor)| scale_and_clamp(cell, factor, &bounding_box))
        .collect())
}
