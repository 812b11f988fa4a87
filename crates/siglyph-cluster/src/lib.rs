// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Embedding and clustering of symbolic distance matrices.

pub mod dimension;
pub mod hierarchy;
pub mod pcoa;

use ndarray::Array2;
use siglyph_align::DistanceMatrix;
use thiserror::Error;

pub use dimension::{best_dimension, dimension_variance_curve};
pub use hierarchy::{cut_at_count, linkage, Linkage, LinkageRow};
pub use pcoa::{pcoa, reduced_distances, Pcoa};

/// Errors produced by embedding and clustering.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("distance matrix must be square, got {rows}x{cols}")]
    NonSquare { rows: usize, cols: usize },
    #[error("at least 2 observations are required, got {0}")]
    TooSmall(usize),
    #[error("at least one component is required")]
    ZeroComponents,
    #[error("requested dimension {requested} exceeds the {available} available")]
    BadDimension { requested: usize, available: usize },
    #[error("cluster count {requested} is outside 1..={n}")]
    BadClusterCount { requested: usize, n: usize },
}

/// A distance matrix together with its principal-coordinate embedding;
/// the entry point for downstream clustering.
#[derive(Clone, Debug)]
pub struct PairwiseAnalysis {
    names: Vec<String>,
    d: Array2<f64>,
    embedding: Pcoa,
}

impl PairwiseAnalysis {
    /// Embed a pairwise matrix; `n_components == None` keeps all axes.
    pub fn new(matrix: &DistanceMatrix, n_components: Option<usize>) -> Result<Self, ClusterError> {
        let embedding = pcoa(&matrix.d, n_components)?;
        tracing::debug!(
            n = matrix.names.len(),
            components = embedding.coords.ncols(),
            "pairwise analysis embedded"
        );
        Ok(Self {
            names: matrix.names.clone(),
            d: matrix.d.clone(),
            embedding,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn coordinates(&self) -> &Array2<f64> {
        &self.embedding.coords
    }

    pub fn eigenvalues(&self) -> &[f64] {
        &self.embedding.eigenvalues
    }

    /// The distance matrix the embedding was built from.
    pub fn distances(&self) -> &Array2<f64> {
        &self.d
    }

    /// Distances recomputed from the first `n_dims` embedding axes.
    pub fn reduced_distances(&self, n_dims: usize) -> Result<Array2<f64>, ClusterError> {
        reduced_distances(&self.embedding.coords, n_dims)
    }

    /// Agglomerate the Euclidean distances recomputed from the first
    /// `n_dims` embedding axes.
    pub fn linkage(&self, n_dims: usize, method: Linkage) -> Result<Vec<LinkageRow>, ClusterError> {
        let reduced = self.reduced_distances(n_dims)?;
        linkage(&reduced, method)
    }

    /// Labels for exactly `t` clusters over the `n_dims`-reduced distances.
    pub fn clusters(
        &self,
        t: usize,
        n_dims: usize,
        method: Linkage,
    ) -> Result<Vec<usize>, ClusterError> {
        let merges = self.linkage(n_dims, method)?;
        cut_at_count(&merges, self.names.len(), t)
    }

    /// Fraction of structure captured per embedding-dimension prefix.
    pub fn dimension_variance_curve(&self) -> Result<Vec<f64>, ClusterError> {
        dimension_variance_curve(&self.embedding.coords)
    }

    /// Smallest dimension count crossing `threshold` on the curve.
    pub fn best_dimension(&self, threshold: f64) -> Result<usize, ClusterError> {
        Ok(best_dimension(
            &self.dimension_variance_curve()?,
            threshold,
        ))
    }
}
