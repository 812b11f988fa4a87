// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Multi-channel tensor assembly.
//!
//! Equal-length full-resolution symbolic channels are turned into one
//! numeric tensor: a random (but seeded, hence reproducible) embedding
//! row per letter, plus a sinusoidal time encoding, plus a per-channel
//! identity encoding when channels keep their own axis.

use crate::DeconvError;
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use siglyph_codec::{encode_fullres, AggregateOp, SinusoidalCodec};
use siglyph_core::{Letter, SymbolicString};
use std::collections::BTreeMap;

/// Fixed seed for the per-letter embedding rows.
const EMBEDDING_SEED: u64 = 42;

/// Default maximum period of the per-channel identity encoding.
const CHANNEL_PE_PERIOD: f64 = 10_000.0;

/// Assembled channel tensor, in one of two layouts.
#[derive(Clone, Debug)]
pub enum ChannelTensor {
    /// Channel-major flattening `(M·T, d)`: all samples of channel 0,
    /// then channel 1, and so on, each row carrying its time encoding.
    Raster {
        data: Array2<f64>,
        t: usize,
        m: usize,
    },
    /// `(T, M, d)` with time and channel encodings added per axis.
    Stacked { data: Array3<f64> },
}

impl ChannelTensor {
    /// `(T, M, d)` regardless of layout.
    pub fn dims(&self) -> (usize, usize, usize) {
        match self {
            ChannelTensor::Raster { data, t, m } => (*t, *m, data.ncols()),
            ChannelTensor::Stacked { data } => data.dim(),
        }
    }

    /// Time-major `(T·M, d)` view used by the deconvolution: row
    /// `t·M + m` holds sample `t` of channel `m` in both layouts.
    pub fn flattened(&self) -> Array2<f64> {
        match self {
            ChannelTensor::Raster { data, t, m } => {
                let d = data.ncols();
                let mut out = Array2::zeros((t * m, d));
                for ch in 0..*m {
                    for s in 0..*t {
                        for k in 0..d {
                            out[(s * m + ch, k)] = data[(ch * t + s, k)];
                        }
                    }
                }
                out
            }
            ChannelTensor::Stacked { data } => {
                let (t, m, d) = data.dim();
                let mut out = Array2::zeros((t * m, d));
                for s in 0..t {
                    for ch in 0..m {
                        for k in 0..d {
                            out[(s * m + ch, k)] = data[(s, ch, k)];
                        }
                    }
                }
                out
            }
        }
    }
}

/// Builder for [`ChannelTensor`]s.
#[derive(Clone, Debug)]
pub struct ChannelTensorBuilder {
    d: usize,
    rasterscan: bool,
    channel_pe_period: f64,
}

impl ChannelTensorBuilder {
    /// `d` is the embedding dimension (must be even for the positional
    /// codecs).
    pub fn new(d: usize) -> Self {
        Self {
            d,
            rasterscan: true,
            channel_pe_period: CHANNEL_PE_PERIOD,
        }
    }

    /// Keep a separate channel axis instead of raster flattening.
    pub fn stacked(mut self) -> Self {
        self.rasterscan = false;
        self
    }

    pub fn with_channel_pe_period(mut self, period: f64) -> Self {
        self.channel_pe_period = period;
        self
    }

    /// Seeded standard-normal embedding rows for the sorted union of
    /// letters across `channels`.
    pub fn letter_embeddings(
        &self,
        channels: &[SymbolicString],
    ) -> Result<BTreeMap<Letter, Vec<f64>>, DeconvError> {
        let mut letters: Vec<Letter> = Vec::new();
        for ch in channels {
            for c in ch.symbols().chars() {
                let letter = Letter::from_char(c).map_err(|_| DeconvError::UnknownSymbol(c))?;
                if !letters.contains(&letter) {
                    letters.push(letter);
                }
            }
        }
        letters.sort_unstable();
        let mut rng = StdRng::seed_from_u64(EMBEDDING_SEED);
        let mut rows = BTreeMap::new();
        for letter in letters {
            let row: Vec<f64> = (0..self.d).map(|_| rng.sample(StandardNormal)).collect();
            rows.insert(letter, row);
        }
        Ok(rows)
    }

    /// Assemble the tensor from equal-length, equal-`dx` channels.
    pub fn build(&self, channels: &[SymbolicString]) -> Result<ChannelTensor, DeconvError> {
        if channels.is_empty() {
            return Err(DeconvError::NoChannels);
        }
        let t = channels[0].len();
        if t == 0 {
            return Err(DeconvError::EmptyChannel);
        }
        for ch in channels {
            if ch.len() != t {
                return Err(DeconvError::LengthMismatch {
                    expected: t,
                    got: ch.len(),
                });
            }
            if ch.dx() != channels[0].dx() {
                return Err(DeconvError::DxMismatch {
                    left: channels[0].dx(),
                    right: ch.dx(),
                });
            }
        }
        let m = channels.len();
        let embeddings = self.letter_embeddings(channels)?;
        let time_codec = SinusoidalCodec::new(self.d, t as f64)?;
        let ticks = ndarray::Array1::from_iter((0..t).map(|i| i as f64));
        let pe_t = time_codec.encode(&ticks);

        if self.rasterscan {
            let mut data = Array2::zeros((t * m, self.d));
            for (ch, seq) in channels.iter().enumerate() {
                for (s, c) in seq.symbols().chars().enumerate() {
                    let letter = Letter::from_char(c).map_err(|_| DeconvError::UnknownSymbol(c))?;
                    let row = &embeddings[&letter];
                    for k in 0..self.d {
                        data[(ch * t + s, k)] = row[k] + pe_t[(s, k)];
                    }
                }
            }
            Ok(ChannelTensor::Raster { data, t, m })
        } else {
            let pe_m = self.channel_encoding(channels)?;
            let mut data = Array3::zeros((t, m, self.d));
            for (ch, seq) in channels.iter().enumerate() {
                for (s, c) in seq.symbols().chars().enumerate() {
                    let letter = Letter::from_char(c).map_err(|_| DeconvError::UnknownSymbol(c))?;
                    let row = &embeddings[&letter];
                    for k in 0..self.d {
                        data[(s, ch, k)] = row[k] + pe_t[(s, k)] + pe_m[(ch, k)];
                    }
                }
            }
            Ok(ChannelTensor::Stacked { data })
        }
    }

    /// Per-channel identity encoding `(M, d)`: the sum over the
    /// channel's letters of their aggregated occurrence embeddings,
    /// divided by the number of letters in the collection union.
    pub fn channel_encoding(
        &self,
        channels: &[SymbolicString],
    ) -> Result<Array2<f64>, DeconvError> {
        let union = self.letter_embeddings(channels)?.len();
        let mut out = Array2::zeros((channels.len(), self.d));
        for (ch, seq) in channels.iter().enumerate() {
            let mut codes = encode_fullres(seq, self.d, self.channel_pe_period)?;
            codes.aggregate(AggregateOp::Sum);
            let matrix = codes.matrix()?;
            for row in matrix.rows() {
                for k in 0..self.d {
                    out[(ch, k)] += row[k];
                }
            }
            if union > 0 {
                for k in 0..self.d {
                    out[(ch, k)] /= union as f64;
                }
            }
        }
        Ok(out)
    }
}
