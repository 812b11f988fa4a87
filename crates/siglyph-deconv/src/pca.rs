// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! PCA blind deconvolution of a channel tensor.
//!
//! The flattened tensor is column-centred and eigendecomposed through
//! its covariance.  The component count comes from two heuristics on
//! the cumulative explained-variance curve (which carries a leading 0
//! so index equals component count): a variance-loss budget and a
//! corner detector; the larger of the two wins when the corner is
//! accepted, and the result is capped by `max_components`.

use crate::tensor::ChannelTensor;
use crate::DeconvError;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// Knobs for [`deconvolve`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DeconvolutionParams {
    /// Hard cap on extracted components.
    pub max_components: usize,
    /// Fraction of total variance allowed to be lost, in `[0, 1)`.
    pub variance_loss_budget: f64,
}

impl Default for DeconvolutionParams {
    fn default() -> Self {
        Self {
            max_components: 64,
            variance_loss_budget: 0.25,
        }
    }
}

/// Extracted latent sources.
#[derive(Clone, Debug)]
pub struct Deconvolution {
    /// `(k, d)` spectral basis vectors.
    pub components: Array2<f64>,
    /// `(T, M, k)` per-source images over time and channel.
    pub sources: Array3<f64>,
    /// Explained-variance ratio of each selected component.
    pub explained_variance: Vec<f64>,
    /// Components needed to stay within the variance budget.
    pub budget_count: usize,
    /// Accepted corner of the cumulative curve, when significant.
    pub corner_count: Option<usize>,
}

/// First index of the cumulative curve reaching `1 - loss`.  The curve
/// starts at 0, so the index is directly a component count.
pub fn budget_count(cumulative: &[f64], loss: f64) -> usize {
    let target = 1.0 - loss;
    cumulative
        .iter()
        .position(|&v| v >= target)
        .unwrap_or(cumulative.len().saturating_sub(1))
}

/// Corner of a monotone cumulative curve: the point of maximum
/// deviation above the straight chord from first to last value.
///
/// The corner is rejected (None) when it sits at the very start or when
/// its deviation is under twice the mean post-corner slope, meaning the
/// curve bends too gently for the corner to be a real elbow.
pub fn find_corner(cumulative: &[f64]) -> Option<usize> {
    let n = cumulative.len();
    if n < 3 {
        return None;
    }
    let y0 = cumulative[0];
    let y1 = cumulative[n - 1];
    let slope = (y1 - y0) / (n - 1) as f64;
    let mut arg = 0usize;
    let mut best = f64::NEG_INFINITY;
    for (i, &y) in cumulative.iter().enumerate() {
        let delta = y - (y0 + slope * i as f64);
        if delta > best {
            best = delta;
            arg = i;
        }
    }
    // the curve carries a leading 0: shift back to a component count
    let corner = arg.checked_sub(1)?;
    if corner == 0 {
        return None;
    }
    let post: Vec<f64> = cumulative[corner..].windows(2).map(|w| w[1] - w[0]).collect();
    if post.is_empty() {
        return None;
    }
    let trend = post.iter().sum::<f64>() / post.len() as f64;
    let deviation = cumulative[corner] - (y0 + slope * corner as f64);
    if deviation < 2.0 * trend {
        return None;
    }
    Some(corner)
}

/// Deconvolve a channel tensor into latent sources.
pub fn deconvolve(
    tensor: &ChannelTensor,
    params: &DeconvolutionParams,
) -> Result<Deconvolution, DeconvError> {
    if !(0.0..1.0).contains(&params.variance_loss_budget) {
        return Err(DeconvError::BadVarianceBudget(params.variance_loss_budget));
    }
    if params.max_components == 0 {
        return Err(DeconvError::ZeroComponents);
    }
    let (t, m, d) = tensor.dims();
    let mut x = tensor.flattened();
    let rows = x.nrows();
    if rows < 2 {
        return Err(DeconvError::TooFewSamples(rows));
    }

    // column centring
    for k in 0..d {
        let mean = x.column(k).sum() / rows as f64;
        for r in 0..rows {
            x[(r, k)] -= mean;
        }
    }

    // covariance eigendecomposition
    let mut cov = DMatrix::zeros(d, d);
    for i in 0..d {
        for j in 0..=i {
            let mut acc = 0.0;
            for r in 0..rows {
                acc += x[(r, i)] * x[(r, j)];
            }
            let v = acc / (rows - 1) as f64;
            cov[(i, j)] = v;
            cov[(j, i)] = v;
        }
    }
    let eig = SymmetricEigen::new(cov);
    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));
    let total: f64 = eig.eigenvalues.iter().map(|&v| v.max(0.0)).sum();
    if total <= 0.0 {
        return Err(DeconvError::DegenerateTensor);
    }
    let ratios: Vec<f64> = order
        .iter()
        .map(|&i| eig.eigenvalues[i].max(0.0) / total)
        .collect();

    let mut cumulative = Vec::with_capacity(d + 1);
    cumulative.push(0.0);
    let mut acc = 0.0;
    for &r in &ratios {
        acc += r;
        cumulative.push(acc);
    }

    let budget = budget_count(&cumulative, params.variance_loss_budget).max(1);
    let corner = find_corner(&cumulative);
    let k = corner
        .map_or(budget, |c| c.max(budget))
        .min(params.max_components)
        .min(d);
    tracing::debug!(budget, ?corner, selected = k, "component selection");

    let mut components = Array2::zeros((k, d));
    for (row, &idx) in order.iter().take(k).enumerate() {
        for j in 0..d {
            components[(row, j)] = eig.eigenvectors[(j, idx)];
        }
    }

    // scores = X_centred · Vᵀ, folded back to (T, M, k)
    let mut sources = Array3::zeros((t, m, k));
    for s in 0..t {
        for ch in 0..m {
            let r = s * m + ch;
            for comp in 0..k {
                let mut score = 0.0;
                for j in 0..d {
                    score += x[(r, j)] * components[(comp, j)];
                }
                sources[(s, ch, comp)] = score;
            }
        }
    }

    Ok(Deconvolution {
        components,
        sources,
        explained_variance: ratios[..k].to_vec(),
        budget_count: budget,
        corner_count: corner,
    })
}
