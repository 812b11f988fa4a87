// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Sinusoidal positional codec and the per-letter segment embeddings
//! built on top of it.

pub mod grouped;
pub mod sinusoid;

use thiserror::Error;

pub use grouped::{
    encode_fullres, AggregateOp, FullResCodes, GroupedCodes, GroupedSegmentCodec, LetterEmbedding,
};
pub use sinusoid::{
    complex_distance, unwrap_phases, ComplexNorm, DecodeMethod, Decoded, RoundTrip,
    SinusoidalCodec,
};

/// Errors produced by codec construction and use.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Embedding dimension must be even and positive.
    #[error("embedding dimension {0} must be even and positive")]
    OddDimension(usize),
    /// Maximum period must be strictly positive.
    #[error("maximum period {0} must be strictly positive")]
    NonPositivePeriod(f64),
    /// Feature matrix width does not match the codec dimension.
    #[error("feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// An operation was given nothing to work on.
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
    /// The frequency row could not be pseudo-inverted.
    #[error("frequency row is numerically singular")]
    SingularFrequencies,
    /// A per-occurrence matrix was used where an aggregated vector is
    /// required.
    #[error("letter {0:?} is not aggregated; call aggregate() first")]
    NotAggregated(char),
    /// An aggregated vector was used where occurrence rows are required.
    #[error("letter {0:?} is already aggregated; occurrence rows are gone")]
    AlreadyAggregated(char),
    /// The requested letter has no embedding.
    #[error("letter {0:?} has no embedding")]
    UnknownLetter(char),
}
