// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! The dilated zero-mean bump kernel (Ricker / Mexican-hat shape).

use ndarray::Array1;

/// Sample the Ricker kernel dilated by `scale` on the integer lattice.
///
/// Support is `[-8·scale, 8·scale]` (the conventional truncation for this
/// kernel), amplitude `(2 / (sqrt(3·s)·pi^{1/4}))·(1 − (t/s)²)·exp(−t²/2s²)`.
/// The discrete samples are re-centred so they sum to exactly zero: the
/// segmenter relies on the transform of a constant signal being flat.
pub fn ricker_kernel(scale: u32) -> Array1<f64> {
    let s = scale as f64;
    let half = (8.0 * s).ceil() as i64;
    let amp = 2.0 / ((3.0 * s).sqrt() * std::f64::consts::PI.powf(0.25));
    let mut k = Array1::from_iter((-half..=half).map(|t| {
        let u = t as f64 / s;
        amp * (1.0 - u * u) * (-0.5 * u * u).exp()
    }));
    let mean = k.mean().unwrap_or(0.0);
    k -= mean;
    k
}

/// Same-length convolution of `y` with `kernel` (zero padding outside).
pub(crate) fn convolve_same(y: &Array1<f64>, kernel: &Array1<f64>) -> Array1<f64> {
    let n = y.len();
    let klen = kernel.len();
    let half = klen / 2;
    let mut out = Array1::zeros(n);
    for i in 0..n {
        let mut acc = 0.0;
        for (k, &w) in kernel.iter().enumerate() {
            // out[i] = sum_k kernel[k] * y[i + half - k]
            let j = i as i64 + half as i64 - k as i64;
            if j >= 0 && (j as usize) < n {
                acc += w * y[j as usize];
            }
        }
        out[i] = acc;
    }
    out
}
