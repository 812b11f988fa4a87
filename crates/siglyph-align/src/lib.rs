// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Alignment of symbolic sequences and the distance metrics built on it.

pub mod align;
pub mod distance;
pub mod pairwise;

use siglyph_core::SymbolicError;
use thiserror::Error;

pub use align::{
    align as align_sequences, Alignment, AlignmentCache, AlignmentStats, Engine, GlobalScores,
    MaskSymbol, GAP,
};
pub use distance::{
    excess_entropy, jensen_shannon, letter_jaccard, levenshtein, levenshtein_aligned,
    mismatch_symbols, motif_jaccard,
};
pub use pairwise::{pairwise_distances, DistanceMatrix, Metric, PairwiseConfig};

/// Errors produced by alignment and distance computation.
#[derive(Debug, Error)]
pub enum AlignError {
    /// Sequences sampled at different steps cannot be compared silently.
    #[error("dx mismatch: {left} vs {right} (pass forced=true to override)")]
    DxMismatch { left: f64, right: f64 },
    /// A pairwise matrix needs at least two sequences.
    #[error("pairwise distances need at least 2 sequences, got {0}")]
    TooFewSequences(usize),
    /// Invalid symbols or patterns bubbling up from the value types.
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
}
