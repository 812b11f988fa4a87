// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Minimal signal capability consumed by the pipeline: an ordered numeric
//! domain with a uniform step and a same-length range.  Construction,
//! persistence and synthesis of richer signal containers are external
//! collaborators; the core only needs `(domain, range, dx)` plus an opaque
//! name.

use ndarray::Array1;
use thiserror::Error;

/// Errors produced while validating a [`Signal`].
#[derive(Debug, Error)]
pub enum SignalError {
    /// Domain and range lengths differ.
    #[error("domain has {domain} samples but range has {range}")]
    LengthMismatch { domain: usize, range: usize },
    /// Fewer than two samples: no step can be derived.
    #[error("signal requires at least two samples, got {0}")]
    TooShort(usize),
    /// Domain is not strictly increasing.
    #[error("domain must be strictly increasing (violated at index {0})")]
    NotIncreasing(usize),
    /// Domain step is not uniform within tolerance.
    #[error("domain step is not uniform at index {index}: {step} vs {dx}")]
    NonUniformStep { index: usize, step: f64, dx: f64 },
}

/// A discrete 1D analytical signal (chromatogram, spectrum, time series).
///
/// The domain is strictly increasing with a uniform step `dx`; the name is
/// opaque metadata passed through to result objects.
#[derive(Clone, Debug)]
pub struct Signal {
    x: Array1<f64>,
    y: Array1<f64>,
    name: String,
}

impl Signal {
    /// Relative tolerance used when checking domain-step uniformity.
    const STEP_TOL: f64 = 1e-9;

    pub fn new(
        x: Array1<f64>,
        y: Array1<f64>,
        name: impl Into<String>,
    ) -> Result<Self, SignalError> {
        if x.len() != y.len() {
            return Err(SignalError::LengthMismatch {
                domain: x.len(),
                range: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(SignalError::TooShort(x.len()));
        }
        let dx = x[1] - x[0];
        if dx <= 0.0 {
            return Err(SignalError::NotIncreasing(1));
        }
        for i in 1..x.len() {
            let step = x[i] - x[i - 1];
            if step <= 0.0 {
                return Err(SignalError::NotIncreasing(i));
            }
            if (step - dx).abs() > Self::STEP_TOL * dx.abs().max(1.0) {
                return Err(SignalError::NonUniformStep { index: i, step, dx });
            }
        }
        Ok(Self {
            x,
            y,
            name: name.into(),
        })
    }

    /// Build a signal from a range sampled on `0, dx, 2·dx, …`.
    pub fn from_range(y: Array1<f64>, dx: f64, name: impl Into<String>) -> Result<Self, SignalError> {
        if y.len() < 2 {
            return Err(SignalError::TooShort(y.len()));
        }
        if dx <= 0.0 {
            return Err(SignalError::NotIncreasing(1));
        }
        let x = Array1::from_iter((0..y.len()).map(|i| i as f64 * dx));
        Ok(Self {
            x,
            y,
            name: name.into(),
        })
    }

    pub fn domain(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn range(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Uniform domain step.
    pub fn dx(&self) -> f64 {
        self.x[1] - self.x[0]
    }

    /// Origin of the domain (first sample position).
    pub fn x_origin(&self) -> f64 {
        self.x[0]
    }
}
