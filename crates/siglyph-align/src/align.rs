// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Pairwise alignment of symbolic sequences.
//!
//! Two engines produce the same kind of [`Alignment`] record: a fast
//! longest-matching-block matcher (replace regions are compared
//! position-wise and the shorter side tail-padded with gaps) and a global
//! Needleman-Wunsch aligner with configurable scores.  Alignments are
//! plain values; memoization lives in [`AlignmentCache`], keyed by the
//! content hashes of both sequences so any content change invalidates
//! the entry.

use crate::AlignError;
use siglyph_core::SymbolicString;
use std::collections::HashMap;

/// Gap character used in aligned sequence views.
pub const GAP: char = '-';

/// Alignment engine selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Longest-matching-block heuristic; fast, locally greedy.
    #[default]
    Fast,
    /// Global Needleman-Wunsch; exhaustive, O(n·m).
    Global,
}

/// Substitution scores for the [`Engine::Global`] aligner.
#[derive(Clone, Copy, Debug)]
pub struct GlobalScores {
    pub matched: f64,
    pub mismatch: f64,
    pub gap: f64,
}

impl Default for GlobalScores {
    fn default() -> Self {
        Self {
            matched: 1.0,
            mismatch: 0.0,
            gap: 0.0,
        }
    }
}

/// One aligned position class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskSymbol {
    Match,
    Mismatch,
    Gap,
}

impl MaskSymbol {
    pub fn as_char(self) -> char {
        match self {
            MaskSymbol::Match => '=',
            MaskSymbol::Mismatch => '*',
            MaskSymbol::Gap => ' ',
        }
    }
}

/// Counts over an alignment mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignmentStats {
    pub matches: usize,
    pub mismatches: usize,
    pub gaps: usize,
}

/// The result of aligning two sequences: both gapped views plus the
/// position-wise mask.  All three strings always have equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    pub a: String,
    pub b: String,
    pub mask: String,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn stats(&self) -> AlignmentStats {
        let mut stats = AlignmentStats {
            matches: 0,
            mismatches: 0,
            gaps: 0,
        };
        for c in self.mask.chars() {
            match c {
                '=' => stats.matches += 1,
                '*' => stats.mismatches += 1,
                _ => stats.gaps += 1,
            }
        }
        stats
    }

    /// Fraction of aligned positions that match; 0 for empty alignments.
    pub fn score(&self) -> f64 {
        if self.mask.is_empty() {
            return 0.0;
        }
        self.stats().matches as f64 / self.mask.len() as f64
    }
}

/// Align two sequences; `dx` must agree unless `forced`.
pub fn align(
    a: &SymbolicString,
    b: &SymbolicString,
    engine: Engine,
    forced: bool,
) -> Result<Alignment, AlignError> {
    if !forced && a.dx() != b.dx() {
        return Err(AlignError::DxMismatch {
            left: a.dx(),
            right: b.dx(),
        });
    }
    let sa = a.symbols().as_bytes();
    let sb = b.symbols().as_bytes();
    let alignment = match engine {
        Engine::Fast => align_fast(sa, sb),
        Engine::Global => align_global(sa, sb, GlobalScores::default()),
    };
    debug_assert_eq!(alignment.a.len(), alignment.mask.len());
    debug_assert_eq!(alignment.b.len(), alignment.mask.len());
    Ok(alignment)
}

fn mask_of(a: &str, b: &str) -> String {
    a.chars()
        .zip(b.chars())
        .map(|(x, y)| {
            if x == GAP || y == GAP {
                MaskSymbol::Gap
            } else if x == y {
                MaskSymbol::Match
            } else {
                MaskSymbol::Mismatch
            }
            .as_char()
        })
        .collect()
}

/// Longest matching block over `a[alo..ahi]` × `b[blo..bhi]`.
fn longest_match(
    a: &[u8],
    b: &[u8],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut b2j: HashMap<u8, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate().take(bhi).skip(blo) {
        b2j.entry(c).or_default().push(j);
    }
    let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for (i, &c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut new_j2len: HashMap<usize, usize> = HashMap::new();
        if let Some(js) = b2j.get(&c) {
            for &j in js {
                let k = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                new_j2len.insert(j, k);
                if k > bestsize {
                    besti = i + 1 - k;
                    bestj = j + 1 - k;
                    bestsize = k;
                }
            }
        }
        j2len = new_j2len;
    }
    (besti, bestj, bestsize)
}

fn matching_blocks(a: &[u8], b: &[u8]) -> Vec<(usize, usize, usize)> {
    let mut queue = vec![(0usize, a.len(), 0usize, b.len())];
    let mut blocks = Vec::new();
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k > 0 {
            blocks.push((i, j, k));
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
    }
    blocks.sort_unstable();
    blocks.push((a.len(), b.len(), 0));
    blocks
}

fn align_fast(a: &[u8], b: &[u8]) -> Alignment {
    let mut out_a = String::with_capacity(a.len() + b.len());
    let mut out_b = String::with_capacity(a.len() + b.len());
    let (mut ai, mut bj) = (0usize, 0usize);
    for (i, j, k) in matching_blocks(a, b) {
        let ra = &a[ai..i];
        let rb = &b[bj..j];
        // unmatched region: position-wise, shorter side tail-padded
        let span = ra.len().max(rb.len());
        for p in 0..span {
            out_a.push(ra.get(p).map(|&c| c as char).unwrap_or(GAP));
            out_b.push(rb.get(p).map(|&c| c as char).unwrap_or(GAP));
        }
        for p in 0..k {
            out_a.push(a[i + p] as char);
            out_b.push(b[j + p] as char);
        }
        ai = i + k;
        bj = j + k;
    }
    let mask = mask_of(&out_a, &out_b);
    Alignment {
        a: out_a,
        b: out_b,
        mask,
    }
}

fn align_global(a: &[u8], b: &[u8], scores: GlobalScores) -> Alignment {
    let (la, lb) = (a.len(), b.len());
    let mut dp = vec![vec![0.0f64; lb + 1]; la + 1];
    for i in 1..=la {
        dp[i][0] = dp[i - 1][0] + scores.gap;
    }
    for j in 1..=lb {
        dp[0][j] = dp[0][j - 1] + scores.gap;
    }
    for i in 1..=la {
        for j in 1..=lb {
            let sub = if a[i - 1] == b[j - 1] {
                scores.matched
            } else {
                scores.mismatch
            };
            dp[i][j] = (dp[i - 1][j - 1] + sub)
                .max(dp[i - 1][j] + scores.gap)
                .max(dp[i][j - 1] + scores.gap);
        }
    }

    let mut ra = Vec::new();
    let mut rb = Vec::new();
    let (mut i, mut j) = (la, lb);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let sub = if a[i - 1] == b[j - 1] {
                scores.matched
            } else {
                scores.mismatch
            };
            if dp[i][j] == dp[i - 1][j - 1] + sub {
                ra.push(a[i - 1] as char);
                rb.push(b[j - 1] as char);
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && dp[i][j] == dp[i - 1][j] + scores.gap {
            ra.push(a[i - 1] as char);
            rb.push(GAP);
            i -= 1;
        } else {
            ra.push(GAP);
            rb.push(b[j - 1] as char);
            j -= 1;
        }
    }
    ra.reverse();
    rb.reverse();
    let out_a: String = ra.into_iter().collect();
    let out_b: String = rb.into_iter().collect();
    let mask = mask_of(&out_a, &out_b);
    Alignment {
        a: out_a,
        b: out_b,
        mask,
    }
}

/// Memoized alignments keyed by `(hash(a), hash(b), engine)`.
///
/// Sequences are immutable values; a changed sequence has a different
/// content hash and therefore misses the cache.
#[derive(Debug, Default)]
pub struct AlignmentCache {
    map: HashMap<(u64, u64, Engine), Alignment>,
}

impl AlignmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn get_or_align(
        &mut self,
        a: &SymbolicString,
        b: &SymbolicString,
        engine: Engine,
        forced: bool,
    ) -> Result<Alignment, AlignError> {
        let key = (a.content_hash(), b.content_hash(), engine);
        if let Some(hit) = self.map.get(&key) {
            return Ok(hit.clone());
        }
        let alignment = align(a, b, engine, forced)?;
        self.map.insert(key, alignment.clone());
        Ok(alignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglyph_core::SymbolicString;

    fn seq(s: &str) -> SymbolicString {
        SymbolicString::new(s, 1.0, 0, 0.0).unwrap()
    }

    #[test]
    fn identical_sequences_align_perfectly() {
        for engine in [Engine::Fast, Engine::Global] {
            let s = seq("YAZBZAY");
            let al = align(&s, &s, engine, false).unwrap();
            assert_eq!(al.a, "YAZBZAY");
            assert_eq!(al.b, "YAZBZAY");
            assert_eq!(al.mask, "=======");
            assert_eq!(al.score(), 1.0);
        }
    }

    #[test]
    fn lengths_always_agree() {
        let a = seq("YAZBBBZAY");
        let b = seq("YAZYY");
        for engine in [Engine::Fast, Engine::Global] {
            let al = align(&a, &b, engine, false).unwrap();
            assert_eq!(al.a.len(), al.b.len());
            assert_eq!(al.a.len(), al.mask.len());
            // stripping gaps recovers the inputs
            let ra: String = al.a.chars().filter(|&c| c != GAP).collect();
            let rb: String = al.b.chars().filter(|&c| c != GAP).collect();
            assert_eq!(ra, "YAZBBBZAY");
            assert_eq!(rb, "YAZYY");
        }
    }

    #[test]
    fn single_substitution_marked_mismatch() {
        let a = seq("YAZBZAY");
        let b = seq("YAZBZZY");
        let al = align(&a, &b, Engine::Fast, false).unwrap();
        let stats = al.stats();
        assert_eq!(stats.mismatches, 1);
        assert_eq!(stats.gaps, 0);
        assert_eq!(stats.matches, 6);
    }

    #[test]
    fn insertion_shows_as_gap() {
        let a = seq("YAZB");
        let b = seq("YAZZB");
        let al = align(&a, &b, Engine::Global, false).unwrap();
        assert_eq!(al.stats().gaps, 1);
        assert_eq!(al.stats().matches, 4);
    }

    #[test]
    fn dx_mismatch_requires_forcing() {
        let a = seq("YAZB");
        let b = SymbolicString::new("YAZB", 0.5, 0, 0.0).unwrap();
        assert!(matches!(
            align(&a, &b, Engine::Fast, false),
            Err(AlignError::DxMismatch { .. })
        ));
        assert!(align(&a, &b, Engine::Fast, true).is_ok());
    }

    #[test]
    fn cache_hits_on_same_content() {
        let mut cache = AlignmentCache::new();
        let a = seq("YAZBZAY");
        let b = seq("YAZBZZY");
        let first = cache.get_or_align(&a, &b, Engine::Fast, false).unwrap();
        assert_eq!(cache.len(), 1);
        let second = cache.get_or_align(&a, &b, Engine::Fast, false).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(first, second);
        // a different sequence value misses
        let c = seq("YAZBZAY_");
        cache.get_or_align(&c, &b, Engine::Fast, false).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn engines_are_cached_separately() {
        let mut cache = AlignmentCache::new();
        let a = seq("YAZB");
        let b = seq("YAZZB");
        cache.get_or_align(&a, &b, Engine::Fast, false).unwrap();
        cache.get_or_align(&a, &b, Engine::Global, false).unwrap();
        assert_eq!(cache.len(), 2);
    }
}
