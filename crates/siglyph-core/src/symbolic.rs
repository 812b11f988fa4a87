// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Symbolic sequence value types.
//!
//! A transformed signal is segmented into maximal monotonic runs, each
//! coded by one of seven letters describing its sign/direction pattern:
//!
//! - `A`: crosses zero upward (negative → positive)
//! - `Z`: crosses zero downward (positive → negative)
//! - `B`: increasing, entirely non-positive
//! - `Y`: decreasing, entirely non-positive
//! - `C`: increasing, entirely non-negative
//! - `X`: decreasing, entirely non-negative
//! - `_`: flat or degenerate
//!
//! [`SymbolicString`] is a plain immutable value (symbols + sampling
//! metadata); alignment state lives in `siglyph-align`, not here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The full symbolic alphabet in canonical order.
pub const ALPHABET: [char; 7] = ['A', 'B', 'C', 'X', 'Y', 'Z', '_'];

/// Errors raised by symbolic value-type operations.
#[derive(Debug, Error)]
pub enum SymbolicError {
    /// A character outside the 7-letter alphabet was encountered.
    #[error("unknown symbol {0:?}; expected one of A,B,C,X,Y,Z,_")]
    UnknownSymbol(char),
    /// Two sequences with different sampling steps were combined.
    #[error("dx mismatch: {left} vs {right} (pass forced=true to override)")]
    DxMismatch { left: f64, right: f64 },
    /// An empty pattern or sequence where content is required.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// One of the seven segment codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Letter {
    /// Crosses zero upward.
    A,
    /// Increasing, non-positive.
    B,
    /// Increasing, non-negative.
    C,
    /// Decreasing, non-negative.
    X,
    /// Decreasing, non-positive.
    Y,
    /// Crosses zero downward.
    Z,
    /// Flat or degenerate.
    Flat,
}

impl Letter {
    /// Classify a monotonic run from its transformed endpoint values.
    ///
    /// `A`/`Z` are reserved for strict sign reversal; a run touching zero
    /// at exactly one end is classified as the non-crossing letter on that
    /// side.  Values within `tol` of zero are snapped to zero first.
    pub fn classify(start: f64, end: f64, tol: f64) -> Letter {
        let s = if start.abs() > tol { start } else { 0.0 };
        let e = if end.abs() > tol { end } else { 0.0 };
        if s == e {
            return Letter::Flat;
        }
        if s < 0.0 && e > 0.0 {
            return Letter::A;
        }
        if s > 0.0 && e < 0.0 {
            return Letter::Z;
        }
        if s <= 0.0 && e <= 0.0 {
            return if e > s { Letter::B } else { Letter::Y };
        }
        // both non-negative
        if e > s {
            Letter::C
        } else {
            Letter::X
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::A => 'A',
            Letter::B => 'B',
            Letter::C => 'C',
            Letter::X => 'X',
            Letter::Y => 'Y',
            Letter::Z => 'Z',
            Letter::Flat => '_',
        }
    }

    pub fn from_char(c: char) -> Result<Letter, SymbolicError> {
        match c {
            'A' => Ok(Letter::A),
            'B' => Ok(Letter::B),
            'C' => Ok(Letter::C),
            'X' => Ok(Letter::X),
            'Y' => Ok(Letter::Y),
            'Z' => Ok(Letter::Z),
            '_' => Ok(Letter::Flat),
            other => Err(SymbolicError::UnknownSymbol(other)),
        }
    }

    /// True for `A` and `Z` (zero-crossing codes).
    pub fn is_crossing(self) -> bool {
        matches!(self, Letter::A | Letter::Z)
    }

    /// True for strictly increasing codes.
    pub fn is_increasing(self) -> bool {
        matches!(self, Letter::A | Letter::B | Letter::C)
    }

    /// True for strictly decreasing codes.
    pub fn is_decreasing(self) -> bool {
        matches!(self, Letter::X | Letter::Y | Letter::Z)
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One maximal monotonic run of the transformed signal.
///
/// Adjacent segments share their boundary sample in `index_span`, so spans
/// tile `[0, n)` contiguously with the last span closed at `n`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub letter: Letter,
    /// Span in x-units (`x_span.1 - x_span.0`).
    pub width: f64,
    /// Range delta over the run (`T[j] - T[i]`).
    pub height: f64,
    /// `(i, j)` sample indices of the run endpoints.
    pub index_span: (usize, usize),
    /// `(x_i, x_j)` physical positions of the run endpoints.
    pub x_span: (f64, f64),
}

/// A full-resolution symbolic sequence: one symbol per sample (or per
/// interpolated grid point), with its sampling metadata.
///
/// Immutable by construction; comparison across sequences requires equal
/// `dx` unless explicitly forced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolicString {
    symbols: String,
    dx: f64,
    index_origin: usize,
    x_origin: f64,
}

impl SymbolicString {
    pub fn new(
        symbols: impl Into<String>,
        dx: f64,
        index_origin: usize,
        x_origin: f64,
    ) -> Result<Self, SymbolicError> {
        let symbols = symbols.into();
        for c in symbols.chars() {
            Letter::from_char(c)?;
        }
        Ok(Self {
            symbols,
            dx,
            index_origin,
            x_origin,
        })
    }

    pub fn symbols(&self) -> &str {
        &self.symbols
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn index_origin(&self) -> usize {
        self.index_origin
    }

    pub fn x_origin(&self) -> f64 {
        self.x_origin
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Content hash used by alignment caches; any change of symbols or
    /// sampling metadata changes it.
    pub fn content_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut h = std::collections::hash_map::DefaultHasher::new();
        self.symbols.hash(&mut h);
        self.dx.to_bits().hash(&mut h);
        h.finish()
    }

    /// Symbol counts over the letters actually present.
    pub fn histogram(&self) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for c in self.symbols.chars() {
            *counts.entry(c).or_insert(0) += 1;
        }
        counts
    }

    /// Base-2 Shannon entropy of the symbol distribution.
    pub fn entropy(&self) -> f64 {
        entropy_of(self.symbols.as_bytes())
    }

    /// Map symbols to integers via a codebook (default: canonical order,
    /// `_` → 0).
    pub fn vectorized(&self, codebook: Option<&BTreeMap<char, i64>>) -> Vec<i64> {
        let default: BTreeMap<char, i64> = [
            ('A', 1),
            ('B', 2),
            ('C', 3),
            ('X', 4),
            ('Y', 5),
            ('Z', 6),
            ('_', 0),
        ]
        .into_iter()
        .collect();
        let book = codebook.unwrap_or(&default);
        self.symbols
            .chars()
            .map(|c| book.get(&c).copied().unwrap_or(-1))
            .collect()
    }

    /// Distinct letters present.
    pub fn symbol_set(&self) -> Vec<char> {
        let mut set: Vec<char> = self.histogram().into_keys().collect();
        set.sort_unstable();
        set
    }

    /// Concatenate two sequences; `dx` must match unless `forced`.
    pub fn concat(&self, other: &SymbolicString, forced: bool) -> Result<SymbolicString, SymbolicError> {
        if !forced && self.dx != other.dx {
            return Err(SymbolicError::DxMismatch {
                left: self.dx,
                right: other.dx,
            });
        }
        Ok(SymbolicString {
            symbols: format!("{}{}", self.symbols, other.symbols),
            dx: self.dx,
            index_origin: self.index_origin,
            x_origin: self.x_origin,
        })
    }

    /// Find fuzzy occurrences of `pattern`: each pattern letter matches a
    /// maximal run of itself (so `YAZB` matches `YYAAZZZB`).  Matches are
    /// scanned left to right, non-overlapping, greedy.
    pub fn find(&self, pattern: &str) -> Result<Vec<Motif>, SymbolicError> {
        if pattern.is_empty() {
            return Err(SymbolicError::Empty("pattern"));
        }
        let pat: Vec<char> = pattern.chars().collect();
        for &c in &pat {
            Letter::from_char(c)?;
        }
        let seq: Vec<char> = self.symbols.chars().collect();
        let mut out = Vec::new();
        let mut i = 0usize;
        while i < seq.len() {
            if seq[i] != pat[0] {
                i += 1;
                continue;
            }
            let mut pos = i;
            let mut ok = true;
            for (pi, &pc) in pat.iter().enumerate() {
                if pos >= seq.len() || seq[pos] != pc {
                    ok = false;
                    break;
                }
                while pos < seq.len() && seq[pos] == pc {
                    pos += 1;
                }
                // runs of later pattern letters must be distinct symbols;
                // identical neighbours in the pattern would have merged
                let _ = pi;
            }
            if ok {
                out.push(self.motif_at(i, pos, pattern));
                i = pos;
            } else {
                i += 1;
            }
        }
        Ok(out)
    }

    /// Extract motifs matching `pattern` (default canonical `YAZB`) of at
    /// least `minlen` symbols, classified canonical (exact) or variant
    /// (fuzzy run expansion).
    pub fn extract_motifs(&self, pattern: &str, minlen: usize) -> Result<Vec<Motif>, SymbolicError> {
        let found = self.find(pattern)?;
        Ok(found
            .into_iter()
            .filter(|m| m.end - m.start >= minlen)
            .collect())
    }

    fn motif_at(&self, start: usize, end: usize, pattern: &str) -> Motif {
        let text: String = self.symbols[start..end].to_string();
        let class = if text == pattern {
            MotifClass::Canonical
        } else {
            MotifClass::Variant
        };
        Motif {
            start,
            end,
            x_span: (
                self.x_origin + start as f64 * self.dx,
                self.x_origin + end as f64 * self.dx,
            ),
            text,
            class,
        }
    }
}

impl fmt::Display for SymbolicString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbols)
    }
}

/// Canonical-vs-variant classification of an extracted motif.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotifClass {
    /// Exactly the requested pattern.
    Canonical,
    /// Fuzzy run-expanded occurrence.
    Variant,
}

/// One occurrence of a symbolic motif.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motif {
    pub start: usize,
    pub end: usize,
    pub x_span: (f64, f64),
    pub text: String,
    pub class: MotifClass,
}

/// Base-2 Shannon entropy of a byte string's symbol distribution.
pub fn entropy_of(symbols: &[u8]) -> f64 {
    if symbols.is_empty() {
        return 0.0;
    }
    let mut counts = BTreeMap::new();
    for &b in symbols {
        *counts.entry(b).or_insert(0usize) += 1;
    }
    let total = symbols.len() as f64;
    -counts
        .values()
        .map(|&v| {
            let p = v as f64 / total;
            p * p.log2()
        })
        .sum::<f64>()
}
