// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Multiscale zero-mean bump-kernel transform of 1D signals and the
//! symbolic segmenter that turns each transformed array into a 7-letter
//! sequence of maximal monotonic runs.

pub mod baseline;
pub mod kernel;
pub mod segment;
pub mod transform;

pub use baseline::{baseline_filter, BaselineError, BaselineParams};
pub use kernel::ricker_kernel;
pub use segment::{
    expand_index, expand_x, reconstruct, segment_signal, segment_transform, ScaleCode,
};
pub use transform::{MultiscaleTransform, ScaleTransforms, TransformError};
