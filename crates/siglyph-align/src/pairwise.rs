// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Pairwise distance matrices over named symbolic sequences.

use crate::align::{AlignmentCache, Engine};
use crate::distance::{
    excess_entropy, jensen_shannon, letter_jaccard, levenshtein, levenshtein_aligned,
    motif_jaccard,
};
use crate::AlignError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use siglyph_core::SymbolicString;

/// Distance metric selection for [`pairwise_distances`].
#[derive(Clone, Debug, PartialEq)]
pub enum Metric {
    ExcessEntropy,
    JensenShannon,
    MotifJaccard { pattern: String, minlen: usize },
    Levenshtein { aligned: bool },
    LetterJaccard,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::ExcessEntropy
    }
}

/// Configuration of a pairwise run.
#[derive(Clone, Debug, Default)]
pub struct PairwiseConfig {
    pub metric: Metric,
    pub engine: Engine,
    /// Compare sequences with differing `dx` anyway.
    pub forced: bool,
}

/// A symmetric zero-diagonal distance matrix with row/column names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistanceMatrix {
    pub names: Vec<String>,
    pub d: Array2<f64>,
}

impl DistanceMatrix {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.d[(i, j)]
    }
}

/// Build the full `n × n` distance matrix over `sequences`.
///
/// Only the lower triangle is computed; the matrix is mirrored and the
/// diagonal left at zero.  Alignment-based metrics share one cache for
/// the whole run.  Progress is reported at debug level per row.
pub fn pairwise_distances(
    sequences: &[(String, SymbolicString)],
    config: &PairwiseConfig,
) -> Result<DistanceMatrix, AlignError> {
    let n = sequences.len();
    if n < 2 {
        return Err(AlignError::TooFewSequences(n));
    }
    let mut d = Array2::zeros((n, n));
    let mut cache = AlignmentCache::new();
    let total_pairs = n * (n - 1) / 2;
    let mut done = 0usize;
    for i in 0..n {
        let (_, a) = &sequences[i];
        for j in 0..i {
            let (_, b) = &sequences[j];
            let dist = match &config.metric {
                Metric::ExcessEntropy => {
                    let al = cache.get_or_align(a, b, config.engine, config.forced)?;
                    excess_entropy(a, b, &al)
                }
                Metric::JensenShannon => jensen_shannon(a, b),
                Metric::MotifJaccard { pattern, minlen } => {
                    motif_jaccard(a, b, pattern, *minlen)?
                }
                Metric::Levenshtein { aligned } => {
                    if *aligned {
                        let al = cache.get_or_align(a, b, config.engine, config.forced)?;
                        levenshtein_aligned(&al) as f64
                    } else {
                        levenshtein(a, b) as f64
                    }
                }
                Metric::LetterJaccard => letter_jaccard(a, b),
            };
            d[(i, j)] = dist;
            d[(j, i)] = dist;
            done += 1;
        }
        if i > 0 {
            tracing::debug!(
                row = i,
                done,
                total_pairs,
                percent = 100.0 * done as f64 / total_pairs as f64,
                "pairwise distances progress"
            );
        }
    }
    Ok(DistanceMatrix {
        names: sequences.iter().map(|(name, _)| name.clone()).collect(),
        d,
    })
}
