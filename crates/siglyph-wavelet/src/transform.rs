// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Multiscale transform: one same-length coefficient array per scale.

use crate::kernel::{convolve_same, ricker_kernel};
use ndarray::Array1;
use siglyph_core::Signal;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced by the multiscale transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The list of scales was empty.
    #[error("at least one scale is required")]
    EmptyScales,
    /// A scale was zero or the list was not strictly increasing.
    #[error("scales must be positive and strictly increasing")]
    InvalidScales,
    /// The signal is too short to transform at any scale.
    #[error("signal must have at least 2 samples, got {0}")]
    SignalTooShort(usize),
    /// A requested scale has no computed coefficients.
    #[error("scale {0} not present in the transform")]
    UnknownScale(u32),
}

/// Multiscale transformer holding a validated ordered scale set.
#[derive(Clone, Debug)]
pub struct MultiscaleTransform {
    scales: Vec<u32>,
}

impl MultiscaleTransform {
    /// Default scale set: powers of two `1, 2, 4, 8, 16`.
    pub fn default_scales() -> Vec<u32> {
        (0..5).map(|i| 1u32 << i).collect()
    }

    pub fn new(scales: Vec<u32>) -> Result<Self, TransformError> {
        if scales.is_empty() {
            return Err(TransformError::EmptyScales);
        }
        let mut prev = 0u32;
        for &s in &scales {
            if s == 0 || s <= prev {
                return Err(TransformError::InvalidScales);
            }
            prev = s;
        }
        Ok(Self { scales })
    }

    pub fn scales(&self) -> &[u32] {
        &self.scales
    }

    /// Transform `signal` at every scale of the set.
    pub fn transform(&self, signal: &Signal) -> Result<ScaleTransforms, TransformError> {
        if signal.len() < 2 {
            return Err(TransformError::SignalTooShort(signal.len()));
        }
        let mut coeffs = BTreeMap::new();
        for &scale in &self.scales {
            let kernel = ricker_kernel(scale);
            coeffs.insert(scale, convolve_same(signal.range(), &kernel));
        }
        Ok(ScaleTransforms {
            coeffs,
            dx: signal.dx(),
            x_origin: signal.x_origin(),
        })
    }
}

/// Transformed coefficient arrays keyed by scale, sharing the source
/// signal's sampling metadata.
#[derive(Clone, Debug)]
pub struct ScaleTransforms {
    coeffs: BTreeMap<u32, Array1<f64>>,
    dx: f64,
    x_origin: f64,
}

impl ScaleTransforms {
    pub fn scales(&self) -> impl Iterator<Item = u32> + '_ {
        self.coeffs.keys().copied()
    }

    pub fn get(&self, scale: u32) -> Result<&Array1<f64>, TransformError> {
        self.coeffs
            .get(&scale)
            .ok_or(TransformError::UnknownScale(scale))
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn x_origin(&self) -> f64 {
        self.x_origin
    }

    /// Zero out coefficients with magnitude below `threshold`; `None`
    /// uses 1% of the per-scale maximum magnitude.
    pub fn sparsify(&mut self, scale: u32, threshold: Option<f64>) -> Result<usize, TransformError> {
        let coeffs = self
            .coeffs
            .get_mut(&scale)
            .ok_or(TransformError::UnknownScale(scale))?;
        let thres = threshold.unwrap_or_else(|| {
            0.01 * coeffs.iter().fold(0.0f64, |acc, &c| acc.max(c.abs()))
        });
        let mut zeroed = 0usize;
        for c in coeffs.iter_mut() {
            if c.abs() < thres {
                *c = 0.0;
                zeroed += 1;
            }
        }
        Ok(zeroed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use siglyph_core::Signal;

    fn gaussian_peak(n: usize, centre: f64, width: f64) -> Signal {
        let y = Array1::from_iter(
            (0..n).map(|i| (-0.5 * ((i as f64 - centre) / width).powi(2)).exp()),
        );
        Signal::from_range(y, 1.0, "peak").unwrap()
    }

    #[test]
    fn invalid_scale_lists_rejected() {
        assert!(matches!(
            MultiscaleTransform::new(vec![]),
            Err(TransformError::EmptyScales)
        ));
        assert!(matches!(
            MultiscaleTransform::new(vec![2, 1]),
            Err(TransformError::InvalidScales)
        ));
        assert!(matches!(
            MultiscaleTransform::new(vec![0, 1]),
            Err(TransformError::InvalidScales)
        ));
    }

    #[test]
    fn transform_keeps_length_per_scale() {
        let sig = gaussian_peak(128, 64.0, 5.0);
        let t = MultiscaleTransform::new(vec![1, 2, 4]).unwrap();
        let out = t.transform(&sig).unwrap();
        for scale in [1u32, 2, 4] {
            assert_eq!(out.get(scale).unwrap().len(), 128);
        }
        assert!(matches!(out.get(8), Err(TransformError::UnknownScale(8))));
    }

    #[test]
    fn peak_yields_positive_response_at_centre() {
        let sig = gaussian_peak(128, 64.0, 5.0);
        let t = MultiscaleTransform::new(vec![4]).unwrap();
        let out = t.transform(&sig).unwrap();
        let c = out.get(4).unwrap();
        assert!(c[64] > 0.0);
        // side lobes are negative for the bump kernel
        assert!(c[40] < c[64]);
    }

    #[test]
    fn sparsify_zeroes_small_coefficients() {
        let sig = gaussian_peak(64, 32.0, 3.0);
        let t = MultiscaleTransform::new(vec![2]).unwrap();
        let mut out = t.transform(&sig).unwrap();
        let zeroed = out.sparsify(2, None).unwrap();
        assert!(zeroed > 0);
    }
}
