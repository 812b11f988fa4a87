// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Symbolic segmenter: walks a transformed array, cuts it at first-
//! difference sign changes into maximal monotonic runs, and codes each run
//! with one of the seven letters.
//!
//! Run boundaries are shared between neighbouring segments, so the
//! `index_span`s tile `[0, n)` contiguously with no gaps or overlaps.

use crate::transform::{MultiscaleTransform, TransformError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use siglyph_core::{Letter, Segment, Signal, SignalError, SymbolicString};
use std::collections::BTreeMap;

/// Numeric tolerance around zero used when classifying run endpoints.
const ZERO_TOL: f64 = 1e-12;

/// The compact per-segment code of one scale.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScaleCode {
    pub scale: u32,
    pub segments: Vec<Segment>,
    pub dx: f64,
    pub x_origin: f64,
    /// Number of samples of the transformed array the code covers.
    pub n_samples: usize,
}

impl ScaleCode {
    /// Letters as a compact string, one symbol per segment.
    pub fn letters(&self) -> String {
        self.segments.iter().map(|s| s.letter.as_char()).collect()
    }

    /// Total x-span covered by the segments.
    pub fn total_width(&self) -> f64 {
        self.segments.iter().map(|s| s.width).sum()
    }
}

/// Segment a single transformed coefficient array.
///
/// Runs shorter than two samples are coded `_`; all others are classified
/// from their endpoint values per the letter table.
pub fn segment_transform(
    coef: &Array1<f64>,
    dx: f64,
    x_origin: f64,
    scale: u32,
) -> Result<ScaleCode, TransformError> {
    let n = coef.len();
    if n < 2 {
        return Err(TransformError::SignalTooShort(n));
    }

    let sign = |v: f64| -> i8 {
        if v > 0.0 {
            1
        } else if v < 0.0 {
            -1
        } else {
            0
        }
    };
    let diff_signs: Vec<i8> = (1..n).map(|i| sign(coef[i] - coef[i - 1])).collect();
    let mut ends: Vec<usize> = (1..diff_signs.len())
        .filter(|&i| diff_signs[i] != diff_signs[i - 1])
        .collect();
    ends.push(n - 1);

    let mut segments = Vec::with_capacity(ends.len());
    let mut start = 0usize;
    let last = ends.len() - 1;
    for (count, &idx) in ends.iter().enumerate() {
        let letter = if idx - start + 1 < 2 {
            Letter::Flat
        } else {
            Letter::classify(coef[start], coef[idx], ZERO_TOL)
        };
        let x_i = x_origin + start as f64 * dx;
        let x_j = x_origin + idx as f64 * dx;
        // the final segment closes the partition at n
        let end_index = if count == last { idx + 1 } else { idx };
        segments.push(Segment {
            letter,
            width: x_j - x_i,
            height: coef[idx] - coef[start],
            index_span: (start, end_index),
            x_span: (x_i, x_j),
        });
        start = idx;
    }

    Ok(ScaleCode {
        scale,
        segments,
        dx,
        x_origin,
        n_samples: n,
    })
}

/// Transform and segment `signal` at every scale: the
/// `segment(signal, scales) → {scale: code}` contract.
pub fn segment_signal(
    signal: &Signal,
    scales: &[u32],
) -> Result<BTreeMap<u32, ScaleCode>, TransformError> {
    let transformer = MultiscaleTransform::new(scales.to_vec())?;
    let transforms = transformer.transform(signal)?;
    let mut codes = BTreeMap::new();
    for scale in transformer.scales() {
        let coef = transforms.get(*scale)?;
        codes.insert(
            *scale,
            segment_transform(coef, signal.dx(), signal.x_origin(), *scale)?,
        );
    }
    tracing::debug!(scales = scales.len(), "segmented signal at all scales");
    Ok(codes)
}

/// Expand a compact code to full resolution in index mode: each letter is
/// repeated `max(1, j − i)` times, reproducing segment order and covering
/// every original sample exactly once.
pub fn expand_index(code: &ScaleCode) -> SymbolicString {
    let mut symbols = String::with_capacity(code.n_samples);
    for seg in &code.segments {
        let reps = (seg.index_span.1 - seg.index_span.0).max(1);
        for _ in 0..reps {
            symbols.push(seg.letter.as_char());
        }
    }
    let index_origin = code.segments.first().map(|s| s.index_span.0).unwrap_or(0);
    SymbolicString::new(symbols, code.dx, index_origin, code.x_origin)
        .expect("segment letters are always in the alphabet")
}

/// Expand a compact code over a physical-x grid using nearest-segment
/// interpolation; `n_points` defaults to roughly 10 points per x-unit.
pub fn expand_x(code: &ScaleCode, n_points: Option<usize>) -> SymbolicString {
    if code.segments.is_empty() {
        return SymbolicString::new("", code.dx, 0, code.x_origin)
            .expect("empty string is valid");
    }
    let x_start = code.segments.first().unwrap().x_span.0;
    let x_end = code.segments.last().unwrap().x_span.1;
    let total_span: f64 = code.segments.iter().map(|s| s.width).sum();
    let n = n_points.unwrap_or_else(|| (total_span * 10.0).ceil().max(2.0) as usize);
    let centres: Vec<f64> = code
        .segments
        .iter()
        .map(|s| 0.5 * (s.x_span.0 + s.x_span.1))
        .collect();

    let mut symbols = String::with_capacity(n);
    let step = if n > 1 {
        (x_end - x_start) / (n - 1) as f64
    } else {
        0.0
    };
    for i in 0..n {
        let x = x_start + i as f64 * step;
        // nearest centre; centres are sorted by construction
        let k = match centres.binary_search_by(|c| c.total_cmp(&x)) {
            Ok(k) => k,
            Err(k) => {
                if k == 0 {
                    0
                } else if k >= centres.len() {
                    centres.len() - 1
                } else if (x - centres[k - 1]).abs() <= (centres[k] - x).abs() {
                    k - 1
                } else {
                    k
                }
            }
        };
        symbols.push(code.segments[k].letter.as_char());
    }
    SymbolicString::new(symbols, step, 0, x_start)
        .expect("segment letters are always in the alphabet")
}

/// Rebuild a piecewise-linear synthetic signal from a full-resolution
/// symbolic string, mimicking the transformed signal it was derived from.
///
/// Per-letter ramps: `A` −1→1, `Z` 1→−1, `B` −1→0, `Y` 0→−1, `C` 0→1,
/// `X` 1→0, `_` flat zero.  Runs shorter than two symbols are skipped.
pub fn reconstruct(s: &SymbolicString) -> Result<Signal, SignalError> {
    let chars: Vec<char> = s.symbols().chars().collect();
    let mut y = Vec::with_capacity(chars.len());
    let mut i = 0usize;
    while i < chars.len() {
        let letter = chars[i];
        let mut j = i;
        while j < chars.len() && chars[j] == letter {
            j += 1;
        }
        let width = j - i;
        if width < 2 {
            i = j;
            continue;
        }
        let (lo, hi) = match letter {
            'A' => (-1.0, 1.0),
            'Z' => (1.0, -1.0),
            'B' => (-1.0, 0.0),
            'Y' => (0.0, -1.0),
            'C' => (0.0, 1.0),
            'X' => (1.0, 0.0),
            _ => (0.0, 0.0),
        };
        for k in 0..width {
            y.push(lo + (hi - lo) * k as f64 / (width - 1) as f64);
        }
        i = j;
    }
    let x0 = s.x_origin();
    let n = y.len();
    let x = Array1::from_iter((0..n).map(|i| x0 + i as f64 * s.dx()));
    Signal::new(x, Array1::from_vec(y), "reconstructed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn ramp_signal() -> Array1<f64> {
        // flat at -1, ramp to +1 over [40, 60], flat at +1
        Array1::from_iter((0..100).map(|i| {
            if i <= 40 {
                -1.0
            } else if i < 60 {
                -1.0 + 2.0 * (i - 40) as f64 / 20.0
            } else {
                1.0
            }
        }))
    }

    #[test]
    fn ramp_segments_into_flat_a_flat() {
        let code = segment_transform(&ramp_signal(), 1.0, 0.0, 1).unwrap();
        assert_eq!(code.letters(), "_A_");
        assert_relative_eq!(code.segments[1].height, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn index_spans_partition_the_array() {
        let code = segment_transform(&ramp_signal(), 1.0, 0.0, 1).unwrap();
        let mut expected_start = 0usize;
        for seg in &code.segments {
            assert_eq!(seg.index_span.0, expected_start);
            expected_start = seg.index_span.1;
        }
        assert_eq!(expected_start, code.n_samples);
        let covered: usize = code
            .segments
            .iter()
            .map(|s| s.index_span.1 - s.index_span.0)
            .sum();
        assert_eq!(covered, 100);
    }

    #[test]
    fn widths_sum_to_total_span() {
        let y = Array1::from_iter((0..64).map(|i| ((i as f64) * 0.3).sin()));
        let code = segment_transform(&y, 0.5, 0.0, 1).unwrap();
        assert_relative_eq!(code.total_width(), 63.0 * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn segmentation_is_idempotent() {
        let y = Array1::from_iter((0..64).map(|i| ((i as f64) * 0.3).sin()));
        let a = segment_transform(&y, 1.0, 0.0, 1).unwrap();
        let b = segment_transform(&y, 1.0, 0.0, 1).unwrap();
        assert_eq!(a.letters(), b.letters());
        assert_eq!(a.segments, b.segments);
    }

    #[test]
    fn index_expansion_covers_every_sample() {
        let code = segment_transform(&ramp_signal(), 1.0, 0.0, 1).unwrap();
        let full = expand_index(&code);
        assert_eq!(full.len(), 100);
        assert!(full.symbols().starts_with('_'));
        assert!(full.symbols().contains('A'));
        assert!(full.symbols().ends_with('_'));
    }

    #[test]
    fn x_expansion_preserves_order() {
        let code = segment_transform(&ramp_signal(), 1.0, 0.0, 1).unwrap();
        let full = expand_x(&code, Some(500));
        assert_eq!(full.len(), 500);
        let s = full.symbols();
        let first_a = s.find('A').unwrap();
        let last_a = s.rfind('A').unwrap();
        // a single contiguous A region between flats
        assert!(s[..first_a].chars().all(|c| c == '_'));
        assert!(s[first_a..=last_a].chars().all(|c| c == 'A'));
        assert!(s[last_a + 1..].chars().all(|c| c == '_'));
    }

    #[test]
    fn too_short_transform_rejected() {
        let y = Array1::from_vec(vec![1.0]);
        assert!(matches!(
            segment_transform(&y, 1.0, 0.0, 1),
            Err(TransformError::SignalTooShort(1))
        ));
    }

    #[test]
    fn reconstruct_maps_letters_to_ramps() {
        let s = SymbolicString::new("__AAAA__", 1.0, 0, 0.0).unwrap();
        let sig = reconstruct(&s).unwrap();
        assert_eq!(sig.len(), 8);
        assert_relative_eq!(sig.range()[2], -1.0, epsilon = 1e-12);
        assert_relative_eq!(sig.range()[5], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sig.range()[0], 0.0, epsilon = 1e-12);
    }
}
