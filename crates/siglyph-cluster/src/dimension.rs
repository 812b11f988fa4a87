// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! How many embedding dimensions carry the structure of a matrix.

use crate::ClusterError;
use ndarray::Array2;

fn pairwise_total(coords: &Array2<f64>, n_dims: usize) -> f64 {
    let n = coords.nrows();
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..i {
            let mut acc = 0.0;
            for k in 0..n_dims {
                let delta = coords[(i, k)] - coords[(j, k)];
                acc += delta * delta;
            }
            total += acc.sqrt();
        }
    }
    total
}

/// Fraction of total pairwise distance captured by each coordinate
/// prefix: entry `k` is the mass of the first `k + 1` axes.  The curve
/// is non-decreasing and ends at 1.
pub fn dimension_variance_curve(coords: &Array2<f64>) -> Result<Vec<f64>, ClusterError> {
    let (n, d) = coords.dim();
    if n < 2 {
        return Err(ClusterError::TooSmall(n));
    }
    if d == 0 {
        return Err(ClusterError::ZeroComponents);
    }
    let total = pairwise_total(coords, d);
    if total == 0.0 {
        // all points coincide: every prefix captures everything
        return Ok(vec![1.0; d]);
    }
    Ok((1..=d)
        .map(|k| pairwise_total(coords, k) / total)
        .collect())
}

/// Smallest number of dimensions whose prefix crosses `threshold`
/// (default use: 0.5).
pub fn best_dimension(curve: &[f64], threshold: f64) -> usize {
    for (k, &v) in curve.iter().enumerate() {
        if v >= threshold {
            return k + 1;
        }
    }
    curve.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn curve_is_monotone_and_ends_at_one() {
        // points spread mostly along the first axis
        let coords = Array2::from_shape_vec(
            (4, 3),
            vec![
                0.0, 0.1, 0.0, //
                5.0, 0.0, 0.1, //
                10.0, 0.2, 0.0, //
                15.0, 0.1, 0.1,
            ],
        )
        .unwrap();
        let curve = dimension_variance_curve(&coords).unwrap();
        assert_eq!(curve.len(), 3);
        for w in curve.windows(2) {
            assert!(w[1] >= w[0] - 1e-12);
        }
        assert_relative_eq!(*curve.last().unwrap(), 1.0, epsilon = 1e-12);
        // one dominant axis crosses the default threshold immediately
        assert_eq!(best_dimension(&curve, 0.5), 1);
    }

    #[test]
    fn balanced_axes_need_more_dimensions() {
        let coords = Array2::from_shape_vec(
            (3, 2),
            vec![
                0.0, 0.0, //
                3.0, 4.0, //
                6.0, 8.0,
            ],
        )
        .unwrap();
        let curve = dimension_variance_curve(&coords).unwrap();
        // the first axis alone captures 3/5 of each distance
        assert_relative_eq!(curve[0], 0.6, epsilon = 1e-9);
        assert_eq!(best_dimension(&curve, 0.9), 2);
    }

    #[test]
    fn coincident_points_degenerate_to_ones() {
        let coords = Array2::zeros((3, 2));
        let curve = dimension_variance_curve(&coords).unwrap();
        assert_eq!(curve, vec![1.0, 1.0]);
    }
}
