// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Multi-channel tensor assembly and PCA blind deconvolution of
//! symbolic signal collections.

pub mod pca;
pub mod tensor;

use siglyph_codec::CodecError;
use thiserror::Error;

pub use pca::{budget_count, deconvolve, find_corner, Deconvolution, DeconvolutionParams};
pub use tensor::{ChannelTensor, ChannelTensorBuilder};

/// Errors produced by tensor assembly and deconvolution.
#[derive(Debug, Error)]
pub enum DeconvError {
    #[error("at least one channel is required")]
    NoChannels,
    #[error("channels must not be empty")]
    EmptyChannel,
    #[error("channel length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("dx mismatch across channels: {left} vs {right}")]
    DxMismatch { left: f64, right: f64 },
    #[error("unknown symbol {0:?} in channel")]
    UnknownSymbol(char),
    #[error("variance loss budget {0} must be in [0, 1)")]
    BadVarianceBudget(f64),
    #[error("at least one component is required")]
    ZeroComponents,
    #[error("at least 2 flattened samples are required, got {0}")]
    TooFewSamples(usize),
    #[error("tensor carries no variance to decompose")]
    DegenerateTensor,
    #[error(transparent)]
    Codec(#[from] CodecError),
}
