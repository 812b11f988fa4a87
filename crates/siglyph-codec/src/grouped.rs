// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Per-letter embeddings.
//!
//! Two granularities share the sinusoidal codec:
//!
//! - the compact grouped codec embeds each segment's (start, width,
//!   height) triple as three concatenated positional blocks, grouped by
//!   letter, and can invert the embedding back to segments;
//! - the full-resolution codec embeds the occurrence indices of each
//!   letter of a symbolic string, with explicit tagged aggregation so a
//!   vector can never be mistaken for a per-occurrence matrix.

use crate::sinusoid::{DecodeMethod, SinusoidalCodec};
use crate::CodecError;
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use siglyph_core::{Letter, Segment, SymbolicString};
use std::collections::BTreeMap;

/// Grouped per-letter embeddings of a segment list.
#[derive(Clone, Debug)]
pub struct GroupedCodes {
    /// One `(occurrences, 3·d_part)` matrix per letter present.
    pub groups: BTreeMap<Letter, Array2<f64>>,
    pub dx: f64,
    pub d_part: usize,
}

/// Codec embedding segments as `[start | width | height]` positional
/// blocks of `d_part` features each.
#[derive(Clone, Debug)]
pub struct GroupedSegmentCodec {
    part: SinusoidalCodec,
    d_part: usize,
}

impl GroupedSegmentCodec {
    pub fn new(d_part: usize, n: f64) -> Result<Self, CodecError> {
        Ok(Self {
            part: SinusoidalCodec::new(d_part, n)?,
            d_part,
        })
    }

    /// Embed `segments` grouped by letter; `dx` is kept so decoding can
    /// regenerate index spans.
    pub fn encode(&self, segments: &[Segment], dx: f64) -> Result<GroupedCodes, CodecError> {
        if segments.is_empty() {
            return Err(CodecError::EmptyInput("segments"));
        }
        let mut by_letter: BTreeMap<Letter, Vec<&Segment>> = BTreeMap::new();
        for seg in segments {
            by_letter.entry(seg.letter).or_default().push(seg);
        }
        let mut groups = BTreeMap::new();
        for (letter, segs) in by_letter {
            let starts = Array1::from_iter(segs.iter().map(|s| s.x_span.0));
            let widths = Array1::from_iter(segs.iter().map(|s| s.width));
            let heights = Array1::from_iter(segs.iter().map(|s| s.height));
            let mut m = Array2::zeros((segs.len(), 3 * self.d_part));
            m.slice_mut(s![.., 0..self.d_part])
                .assign(&self.part.encode(&starts));
            m.slice_mut(s![.., self.d_part..2 * self.d_part])
                .assign(&self.part.encode(&widths));
            m.slice_mut(s![.., 2 * self.d_part..])
                .assign(&self.part.encode(&heights));
            groups.insert(letter, m);
        }
        Ok(GroupedCodes {
            groups,
            dx,
            d_part: self.d_part,
        })
    }

    /// Invert grouped embeddings back to segments, ordered by start
    /// position.  Index spans are regenerated from `dx`.
    pub fn decode(
        &self,
        codes: &GroupedCodes,
        method: DecodeMethod,
    ) -> Result<Vec<Segment>, CodecError> {
        if codes.d_part != self.d_part {
            return Err(CodecError::DimensionMismatch {
                expected: self.d_part,
                got: codes.d_part,
            });
        }
        let mut segments = Vec::new();
        for (&letter, m) in &codes.groups {
            let starts = self
                .part
                .decode(&m.slice(s![.., 0..self.d_part]).to_owned(), method)?;
            let widths = self
                .part
                .decode(&m.slice(s![.., self.d_part..2 * self.d_part]).to_owned(), method)?;
            let heights = self
                .part
                .decode(&m.slice(s![.., 2 * self.d_part..]).to_owned(), method)?;
            for i in 0..m.nrows() {
                let x = starts.values[i];
                let w = widths.values[i];
                segments.push(Segment {
                    letter,
                    width: w,
                    height: heights.values[i],
                    index_span: (
                        (x / codes.dx).round() as usize,
                        ((x + w) / codes.dx).round() as usize,
                    ),
                    x_span: (x, x + w),
                });
            }
        }
        segments.sort_by(|a, b| a.x_span.0.total_cmp(&b.x_span.0));
        Ok(segments)
    }
}

/// How a per-occurrence matrix was collapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateOp {
    Sum,
    Mean,
}

/// A per-letter full-resolution embedding, tagged by its granularity.
#[derive(Clone, Debug)]
pub enum LetterEmbedding {
    /// One row per occurrence index, shape `(occurrences, d)`.
    PerOccurrence(Array2<f64>),
    /// Collapsed to a single vector; the op is recorded alongside.
    Aggregated { vector: Array1<f64>, op: AggregateOp },
}

/// Full-resolution per-letter embeddings of one symbolic string.
#[derive(Clone, Debug)]
pub struct FullResCodes {
    letters: BTreeMap<Letter, LetterEmbedding>,
    codec: SinusoidalCodec,
}

/// Embed the occurrence indices of every letter of `s` with a sinusoidal
/// codec of dimension `d` and maximum period `n`.
pub fn encode_fullres(s: &SymbolicString, d: usize, n: f64) -> Result<FullResCodes, CodecError> {
    if s.is_empty() {
        return Err(CodecError::EmptyInput("symbolic string"));
    }
    let codec = SinusoidalCodec::new(d, n)?;
    let mut occurrences: BTreeMap<Letter, Vec<f64>> = BTreeMap::new();
    for (i, c) in s.symbols().chars().enumerate() {
        let letter = Letter::from_char(c).map_err(|_| CodecError::UnknownLetter(c))?;
        occurrences.entry(letter).or_default().push(i as f64);
    }
    let letters = occurrences
        .into_iter()
        .map(|(letter, idx)| {
            let m = codec.encode(&Array1::from_vec(idx));
            (letter, LetterEmbedding::PerOccurrence(m))
        })
        .collect();
    Ok(FullResCodes { letters, codec })
}

impl FullResCodes {
    pub fn letters(&self) -> impl Iterator<Item = (&Letter, &LetterEmbedding)> {
        self.letters.iter()
    }

    pub fn dim(&self) -> usize {
        self.codec.dim()
    }

    /// Collapse every per-occurrence matrix with `op`; already-aggregated
    /// entries are left untouched.
    pub fn aggregate(&mut self, op: AggregateOp) {
        for emb in self.letters.values_mut() {
            if let LetterEmbedding::PerOccurrence(m) = emb {
                let mut vector = m.sum_axis(Axis(0));
                if op == AggregateOp::Mean && m.nrows() > 0 {
                    vector /= m.nrows() as f64;
                }
                *emb = LetterEmbedding::Aggregated { vector, op };
            }
        }
    }

    /// Stack aggregated vectors into a `(letters_present, d)` matrix in
    /// canonical letter order.
    pub fn matrix(&self) -> Result<Array2<f64>, CodecError> {
        let mut out = Array2::zeros((self.letters.len(), self.codec.dim()));
        for (row, (letter, emb)) in self.letters.iter().enumerate() {
            match emb {
                LetterEmbedding::Aggregated { vector, .. } => {
                    out.row_mut(row).assign(vector);
                }
                LetterEmbedding::PerOccurrence(_) => {
                    return Err(CodecError::NotAggregated(letter.as_char()));
                }
            }
        }
        Ok(out)
    }

    /// Decode a letter's occurrence indices back from its per-occurrence
    /// embedding.
    pub fn decode_occurrences(
        &self,
        letter: Letter,
        method: DecodeMethod,
    ) -> Result<Vec<usize>, CodecError> {
        match self.letters.get(&letter) {
            Some(LetterEmbedding::PerOccurrence(m)) => {
                let decoded = self.codec.decode(m, method)?;
                Ok(decoded
                    .values
                    .iter()
                    .map(|v| v.round().max(0.0) as usize)
                    .collect())
            }
            Some(LetterEmbedding::Aggregated { .. }) => {
                Err(CodecError::AlreadyAggregated(letter.as_char()))
            }
            None => Err(CodecError::UnknownLetter(letter.as_char())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use siglyph_core::Letter;

    fn sample_segments() -> Vec<Segment> {
        vec![
            Segment {
                letter: Letter::Flat,
                width: 4.0,
                height: 0.0,
                index_span: (0, 4),
                x_span: (0.0, 4.0),
            },
            Segment {
                letter: Letter::A,
                width: 2.0,
                height: 2.0,
                index_span: (4, 6),
                x_span: (4.0, 6.0),
            },
            Segment {
                letter: Letter::Z,
                width: 3.0,
                height: -2.0,
                index_span: (6, 9),
                x_span: (6.0, 9.0),
            },
        ]
    }

    #[test]
    fn grouped_roundtrip_recovers_segments() {
        let codec = GroupedSegmentCodec::new(8, 100.0).unwrap();
        let segments = sample_segments();
        let codes = codec.encode(&segments, 1.0).unwrap();
        let decoded = codec.decode(&codes, DecodeMethod::LeastSquares).unwrap();
        assert_eq!(decoded.len(), segments.len());
        for (orig, dec) in segments.iter().zip(&decoded) {
            assert_eq!(orig.letter, dec.letter);
            assert_eq!(orig.index_span, dec.index_span);
            assert_relative_eq!(orig.width, dec.width, epsilon = 1e-5);
            assert_relative_eq!(orig.height, dec.height, epsilon = 1e-5);
        }
    }

    #[test]
    fn empty_segment_list_rejected() {
        let codec = GroupedSegmentCodec::new(8, 100.0).unwrap();
        assert!(matches!(
            codec.encode(&[], 1.0),
            Err(CodecError::EmptyInput("segments"))
        ));
    }

    #[test]
    fn fullres_matrix_requires_aggregation() {
        let s = SymbolicString::new("_AA_ZZ_", 1.0, 0, 0.0).unwrap();
        let mut codes = encode_fullres(&s, 8, 100.0).unwrap();
        assert!(matches!(codes.matrix(), Err(CodecError::NotAggregated(_))));
        codes.aggregate(AggregateOp::Sum);
        let m = codes.matrix().unwrap();
        // letters present: A, Z, _
        assert_eq!(m.dim(), (3, 8));
    }

    #[test]
    fn mean_aggregation_divides_by_occurrences() {
        let s = SymbolicString::new("AAAA", 1.0, 0, 0.0).unwrap();
        let mut sum = encode_fullres(&s, 8, 100.0).unwrap();
        let mut mean = encode_fullres(&s, 8, 100.0).unwrap();
        sum.aggregate(AggregateOp::Sum);
        mean.aggregate(AggregateOp::Mean);
        let ms = sum.matrix().unwrap();
        let mm = mean.matrix().unwrap();
        for (a, b) in ms.iter().zip(mm.iter()) {
            assert_relative_eq!(*a, 4.0 * *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn occurrence_indices_decode_back() {
        let s = SymbolicString::new("_A_A__A_", 1.0, 0, 0.0).unwrap();
        let codes = encode_fullres(&s, 8, 100.0).unwrap();
        let idx = codes
            .decode_occurrences(Letter::A, DecodeMethod::LeastSquares)
            .unwrap();
        assert_eq!(idx, vec![1, 3, 6]);
        assert!(matches!(
            codes.decode_occurrences(Letter::B, DecodeMethod::LeastSquares),
            Err(CodecError::UnknownLetter('B'))
        ));
    }
}
