// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Classical principal-coordinate analysis (metric MDS).
//!
//! The distance matrix is double-centred, `B = -1/2 · J D² J`, and
//! eigendecomposed; coordinates are eigenvectors scaled by the square
//! roots of the positive eigenvalues, in descending order.  Symbolic
//! distances are not guaranteed Euclidean, so negative eigenvalues can
//! occur; their axes are kept as zero columns rather than silently
//! reshuffling dimensions.

use crate::ClusterError;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;

/// Result of a principal-coordinate embedding.
#[derive(Clone, Debug)]
pub struct Pcoa {
    /// `(n, n_components)` coordinates.
    pub coords: Array2<f64>,
    /// Eigenvalues of the centred matrix, descending, one per component.
    pub eigenvalues: Vec<f64>,
}

fn check_square(d: &Array2<f64>) -> Result<usize, ClusterError> {
    let (rows, cols) = d.dim();
    if rows != cols {
        return Err(ClusterError::NonSquare { rows, cols });
    }
    if rows < 2 {
        return Err(ClusterError::TooSmall(rows));
    }
    Ok(rows)
}

/// Embed a symmetric zero-diagonal distance matrix into `n_components`
/// coordinates (`None` keeps all `n` axes).
pub fn pcoa(d: &Array2<f64>, n_components: Option<usize>) -> Result<Pcoa, ClusterError> {
    let n = check_square(d)?;
    let k = n_components.unwrap_or(n).min(n);
    if k == 0 {
        return Err(ClusterError::ZeroComponents);
    }

    // B = -1/2 J D^2 J, built element-wise from row/column/grand means
    let sq = d.mapv(|v| v * v);
    let row_mean: Vec<f64> = (0..n).map(|i| sq.row(i).sum() / n as f64).collect();
    let grand = sq.sum() / (n * n) as f64;
    let mut b = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            b[(i, j)] = -0.5 * (sq[(i, j)] - row_mean[i] - row_mean[j] + grand);
        }
    }

    let eig = SymmetricEigen::new(b);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let mut coords = Array2::zeros((n, k));
    let mut eigenvalues = Vec::with_capacity(k);
    for (col, &idx) in order.iter().take(k).enumerate() {
        let lambda = eig.eigenvalues[idx];
        eigenvalues.push(lambda);
        if lambda > 0.0 {
            let scale = lambda.sqrt();
            for i in 0..n {
                coords[(i, col)] = eig.eigenvectors[(i, idx)] * scale;
            }
        }
        // non-positive eigenvalue: column stays zero
    }
    Ok(Pcoa {
        coords,
        eigenvalues,
    })
}

/// Euclidean distances recomputed from the first `n_dims` coordinate
/// columns; an explicit approximation of the original matrix.
pub fn reduced_distances(coords: &Array2<f64>, n_dims: usize) -> Result<Array2<f64>, ClusterError> {
    let (n, d) = coords.dim();
    if n_dims == 0 || n_dims > d {
        return Err(ClusterError::BadDimension {
            requested: n_dims,
            available: d,
        });
    }
    let mut out = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..i {
            let mut acc = 0.0;
            for k in 0..n_dims {
                let delta = coords[(i, k)] - coords[(j, k)];
                acc += delta * delta;
            }
            let dist = acc.sqrt();
            out[(i, j)] = dist;
            out[(j, i)] = dist;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Distances of three collinear points: 0-1-3 on a line.
    fn line_matrix() -> Array2<f64> {
        let mut d = Array2::zeros((3, 3));
        let pos: [f64; 3] = [0.0, 1.0, 3.0];
        for i in 0..3 {
            for j in 0..3 {
                d[(i, j)] = (pos[i] - pos[j]).abs();
            }
        }
        d
    }

    #[test]
    fn collinear_points_embed_on_one_axis() {
        let p = pcoa(&line_matrix(), None).unwrap();
        // one dominant eigenvalue; the rest are numerically zero
        assert!(p.eigenvalues[0] > 1.0);
        for &lambda in &p.eigenvalues[1..] {
            assert!(lambda.abs() < 1e-9);
        }
        // pairwise distances are reproduced along the first axis
        for i in 0..3 {
            for j in 0..3 {
                let delta = (p.coords[(i, 0)] - p.coords[(j, 0)]).abs();
                assert_relative_eq!(delta, line_matrix()[(i, j)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn reduced_distances_approximate_original() {
        let d = line_matrix();
        let p = pcoa(&d, None).unwrap();
        let r = reduced_distances(&p.coords, 1).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(r[(i, j)], d[(i, j)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn shape_validation() {
        let bad = Array2::zeros((2, 3));
        assert!(matches!(
            pcoa(&bad, None),
            Err(ClusterError::NonSquare { rows: 2, cols: 3 })
        ));
        let tiny = Array2::zeros((1, 1));
        assert!(matches!(pcoa(&tiny, None), Err(ClusterError::TooSmall(1))));
        let d = line_matrix();
        let p = pcoa(&d, Some(2)).unwrap();
        assert_eq!(p.coords.dim(), (3, 2));
        assert!(matches!(
            reduced_distances(&p.coords, 5),
            Err(ClusterError::BadDimension { .. })
        ));
    }
}
