// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Optional baseline-removal preprocessing: moving-median baseline
//! subtraction followed by a local Poisson / Bienaymé–Tchebychev
//! threshold that suppresses low-intensity noise.

use ndarray::Array1;
use thiserror::Error;

/// Errors produced by the baseline filter.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// Window smaller than the minimum useful size.
    #[error("window width {0} is below the minimum of 3")]
    WindowTooSmall(usize),
    /// Window at least as long as the signal.
    #[error("window width {w} must be smaller than signal length {n}")]
    WindowTooLarge { w: usize, n: usize },
}

/// Parameters for [`baseline_filter`].
#[derive(Clone, Copy, Debug)]
pub struct BaselineParams {
    /// Window size for baseline and local statistics; `None` defaults to
    /// `max(11, 1% of n)`, forced odd.
    pub window: Option<usize>,
    /// Bienaymé–Tchebychev multiplier.
    pub k: f64,
    /// Sampling time step.
    pub dt: f64,
}

impl Default for BaselineParams {
    fn default() -> Self {
        Self {
            window: None,
            k: 2.0,
            dt: 1.0,
        }
    }
}

/// Remove a moving-median baseline and zero samples below the local
/// Chebyshev bound `k·sqrt(10·λ·dt)` where `λ` is a Poisson rate estimated
/// from the local coefficient of variation.
pub fn baseline_filter(y: &Array1<f64>, params: BaselineParams) -> Result<Array1<f64>, BaselineError> {
    let n = y.len();
    let mut w = match params.window {
        Some(w) => {
            if w < 3 {
                return Err(BaselineError::WindowTooSmall(w));
            }
            w
        }
        None => (n / 100).max(11),
    };
    if w % 2 == 0 {
        w += 1;
    }
    if w >= n {
        return Err(BaselineError::WindowTooLarge { w, n });
    }

    // moving-median baseline
    let baseline = moving_median(y, w);
    let mut s = Array1::from_iter(y.iter().zip(baseline.iter()).map(|(&v, &b)| (v - b).max(0.0)));

    // local mean and std over the same window
    let mean = moving_mean(&s, w);
    let sq = moving_mean(&s.mapv(|v| v * v), w);
    for i in 0..n {
        let var = (sq[i] - mean[i] * mean[i]).max(0.0);
        let std = var.sqrt();
        let cv = if mean[i] > 0.0 { std / mean[i] } else { 0.0 };
        let lam = if cv > 0.0 { 1.0 / (cv * cv) } else { 0.0 };
        let threshold = params.k * (10.0 * lam * params.dt).sqrt();
        if s[i] < threshold {
            s[i] = 0.0;
        }
    }
    Ok(s)
}

fn moving_median(y: &Array1<f64>, w: usize) -> Array1<f64> {
    let n = y.len();
    let half = w / 2;
    let mut out = Array1::zeros(n);
    let mut buf = Vec::with_capacity(w);
    for i in 0..n {
        buf.clear();
        // zero padding at the borders, matching the median-filter convention
        for k in 0..w {
            let j = i as i64 + k as i64 - half as i64;
            if j >= 0 && (j as usize) < n {
                buf.push(y[j as usize]);
            } else {
                buf.push(0.0);
            }
        }
        buf.sort_by(|a, b| a.total_cmp(b));
        out[i] = buf[half];
    }
    out
}

fn moving_mean(y: &Array1<f64>, w: usize) -> Array1<f64> {
    let n = y.len();
    let half = w / 2;
    let mut out = Array1::zeros(n);
    for i in 0..n {
        let mut acc = 0.0;
        for k in 0..w {
            // nearest padding at the borders
            let j = (i as i64 + k as i64 - half as i64).clamp(0, n as i64 - 1) as usize;
            acc += y[j];
        }
        out[i] = acc / w as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn window_bounds_enforced() {
        let y = Array1::zeros(50);
        assert!(matches!(
            baseline_filter(
                &y,
                BaselineParams {
                    window: Some(2),
                    ..Default::default()
                }
            ),
            Err(BaselineError::WindowTooSmall(2))
        ));
        assert!(matches!(
            baseline_filter(
                &y,
                BaselineParams {
                    window: Some(60),
                    ..Default::default()
                }
            ),
            Err(BaselineError::WindowTooLarge { .. })
        ));
    }

    #[test]
    fn flat_noiseless_signal_filters_to_zero() {
        let y = Array1::from_elem(200, 5.0);
        let out = baseline_filter(&y, BaselineParams::default()).unwrap();
        // constant signal equals its own baseline
        let max = out.iter().cloned().fold(0.0f64, f64::max);
        assert!(max < 1e-9);
    }

    #[test]
    fn tall_peak_survives_filtering() {
        let mut y = Array1::from_elem(300, 1.0);
        for i in 140..160 {
            let u = (i as f64 - 150.0) / 4.0;
            y[i] += 100.0 * (-0.5 * u * u).exp();
        }
        // window wide enough that the peak does not dominate the median
        let params = BaselineParams {
            window: Some(31),
            ..Default::default()
        };
        let out = baseline_filter(&y, params).unwrap();
        assert!(out[150] > 50.0);
    }
}
