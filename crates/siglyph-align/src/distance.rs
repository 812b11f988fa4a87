// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Distance metrics between symbolic sequences.
//!
//! Four families: information-theoretic (excess entropy over an
//! alignment, Jensen-Shannon over raw histograms), set-based (Jaccard on
//! motif start positions, Jaccard on letter sets) and edit distance
//! (Levenshtein, raw or on pre-aligned views).

use crate::align::{Alignment, GAP};
use crate::AlignError;
use siglyph_core::{entropy_of, SymbolicString};
use std::collections::BTreeSet;

/// True for the six directional letters; gaps and `_` carry no shape
/// information and are excluded from entropy computations.
fn informative(c: char) -> bool {
    matches!(c, 'A' | 'B' | 'C' | 'X' | 'Y' | 'Z')
}

fn filtered_entropy(s: &str) -> f64 {
    let bytes: Vec<u8> = s.bytes().filter(|&b| informative(b as char)).collect();
    entropy_of(&bytes)
}

/// Excess entropy `H(A) + H(B) - 2·H(shared)` in bits.
///
/// `shared` is the aligned view of `a` restricted to positions where the
/// mask records a match; all three entropies ignore gaps and `_`, so a
/// sequence has zero excess entropy against itself.
pub fn excess_entropy(a: &SymbolicString, b: &SymbolicString, alignment: &Alignment) -> f64 {
    let shared: String = alignment
        .a
        .chars()
        .zip(alignment.mask.chars())
        .filter(|&(c, m)| m == '=' && informative(c))
        .map(|(c, _)| c)
        .collect();
    filtered_entropy(a.symbols()) + filtered_entropy(b.symbols()) - 2.0 * filtered_entropy(&shared)
}

/// Jensen-Shannon distance (square root of the base-2 divergence)
/// between the raw symbol histograms; bounded in `[0, 1]`.
pub fn jensen_shannon(a: &SymbolicString, b: &SymbolicString) -> f64 {
    let ha = a.histogram();
    let hb = b.histogram();
    let keys: BTreeSet<char> = ha.keys().chain(hb.keys()).copied().collect();
    if keys.is_empty() {
        return 0.0;
    }
    let ta: f64 = ha.values().sum::<usize>() as f64;
    let tb: f64 = hb.values().sum::<usize>() as f64;
    let mut divergence = 0.0;
    for &k in &keys {
        let p = ha.get(&k).copied().unwrap_or(0) as f64 / ta;
        let q = hb.get(&k).copied().unwrap_or(0) as f64 / tb;
        let m = 0.5 * (p + q);
        if p > 0.0 {
            divergence += 0.5 * p * (p / m).log2();
        }
        if q > 0.0 {
            divergence += 0.5 * q * (q / m).log2();
        }
    }
    divergence.max(0.0).sqrt()
}

/// Jaccard distance on motif start-position sets.
///
/// Motifs are fuzzy occurrences of `pattern` of at least `minlen`
/// symbols.  An empty union means neither sequence contains the motif;
/// that is reported as the maximum distance 1.0 because the metric is
/// uninformative there, not because the sequences agree.
pub fn motif_jaccard(
    a: &SymbolicString,
    b: &SymbolicString,
    pattern: &str,
    minlen: usize,
) -> Result<f64, AlignError> {
    let pa: BTreeSet<usize> = a
        .extract_motifs(pattern, minlen)?
        .into_iter()
        .map(|m| m.start)
        .collect();
    let pb: BTreeSet<usize> = b
        .extract_motifs(pattern, minlen)?
        .into_iter()
        .map(|m| m.start)
        .collect();
    let union = pa.union(&pb).count();
    if union == 0 {
        return Ok(1.0);
    }
    let inter = pa.intersection(&pb).count();
    Ok(1.0 - inter as f64 / union as f64)
}

/// Jaccard distance on the sets of distinct letters; 0.0 when both
/// sequences are empty.
pub fn letter_jaccard(a: &SymbolicString, b: &SymbolicString) -> f64 {
    let sa: BTreeSet<char> = a.symbols().chars().collect();
    let sb: BTreeSet<char> = b.symbols().chars().collect();
    let union = sa.union(&sb).count();
    if union == 0 {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count();
    1.0 - inter as f64 / union as f64
}

/// Levenshtein distance between the raw sequences.
pub fn levenshtein(a: &SymbolicString, b: &SymbolicString) -> usize {
    levenshtein_bytes(a.symbols().as_bytes(), b.symbols().as_bytes())
}

/// Levenshtein distance between the two gapped views of an alignment.
pub fn levenshtein_aligned(alignment: &Alignment) -> usize {
    levenshtein_bytes(alignment.a.as_bytes(), alignment.b.as_bytes())
}

fn levenshtein_bytes(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Symbols of `a` that mismatch under an alignment (gap positions in
/// `b` excluded), as in sequence subtraction.
pub fn mismatch_symbols(alignment: &Alignment) -> String {
    alignment
        .a
        .chars()
        .zip(alignment.b.chars())
        .filter(|&(x, y)| x != y && y != GAP && x != GAP)
        .map(|(x, _)| x)
        .collect()
}
