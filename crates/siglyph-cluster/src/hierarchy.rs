// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Agglomerative hierarchical clustering via Lance-Williams updates.
//!
//! Cluster ids follow the linkage convention: leaves are `0..n`, the
//! cluster created by merge row `r` is `n + r`.

use crate::ClusterError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Linkage update rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Linkage {
    #[default]
    Ward,
    Single,
    Complete,
    Average,
}

/// One merge of the agglomeration, in merge order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkageRow {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

/// Agglomerate a symmetric distance matrix into `n - 1` merges.
pub fn linkage(d: &Array2<f64>, method: Linkage) -> Result<Vec<LinkageRow>, ClusterError> {
    let (rows, cols) = d.dim();
    if rows != cols {
        return Err(ClusterError::NonSquare { rows, cols });
    }
    let n = rows;
    if n < 2 {
        return Err(ClusterError::TooSmall(n));
    }

    // ward works on squared distances, the rest on plain ones
    let squared = method == Linkage::Ward;
    let mut work: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let v = d[(i, j)];
                    if squared {
                        v * v
                    } else {
                        v
                    }
                })
                .collect()
        })
        .collect();
    let mut size = vec![1usize; n];
    let mut id: Vec<usize> = (0..n).collect();
    let mut active = vec![true; n];

    let mut merges = Vec::with_capacity(n - 1);
    for step in 0..n - 1 {
        // global minimum over active pairs
        let (mut bi, mut bj, mut best) = (0usize, 0usize, f64::INFINITY);
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in 0..i {
                if !active[j] {
                    continue;
                }
                if work[i][j] < best {
                    best = work[i][j];
                    bi = i;
                    bj = j;
                }
            }
        }

        let (ni, nj) = (size[bi] as f64, size[bj] as f64);
        let merge_dist = if squared { best.max(0.0).sqrt() } else { best };
        merges.push(LinkageRow {
            left: id[bi].min(id[bj]),
            right: id[bi].max(id[bj]),
            distance: merge_dist,
            size: size[bi] + size[bj],
        });

        // fold bj into bi, then update distances to every other cluster
        for k in 0..n {
            if !active[k] || k == bi || k == bj {
                continue;
            }
            let (dki, dkj) = (work[k.max(bi)][k.min(bi)], work[k.max(bj)][k.min(bj)]);
            let nk = size[k] as f64;
            let updated = match method {
                Linkage::Single => dki.min(dkj),
                Linkage::Complete => dki.max(dkj),
                Linkage::Average => (ni * dki + nj * dkj) / (ni + nj),
                Linkage::Ward => {
                    ((ni + nk) * dki + (nj + nk) * dkj - nk * best) / (ni + nj + nk)
                }
            };
            work[k.max(bi)][k.min(bi)] = updated;
        }
        size[bi] += size[bj];
        active[bj] = false;
        id[bi] = n + step;
    }
    Ok(merges)
}

/// Cut a linkage into exactly `t` clusters; labels are dense, ordered by
/// first appearance over the leaves.
pub fn cut_at_count(
    merges: &[LinkageRow],
    n_leaves: usize,
    t: usize,
) -> Result<Vec<usize>, ClusterError> {
    if t == 0 || t > n_leaves {
        return Err(ClusterError::BadClusterCount {
            requested: t,
            n: n_leaves,
        });
    }
    // union-find over leaves; cluster id -> representative leaf
    let mut parent: Vec<usize> = (0..n_leaves).collect();
    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        let mut root = x;
        while parent[root] != root {
            root = parent[root];
        }
        let mut cur = x;
        while parent[cur] != root {
            let next = parent[cur];
            parent[cur] = root;
            cur = next;
        }
        root
    }

    let mut member: Vec<usize> = (0..n_leaves).collect();
    for (r, row) in merges.iter().take(n_leaves - t).enumerate() {
        let a = member[row.left];
        let b = member[row.right];
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        parent[rb] = ra;
        member.push(ra);
        debug_assert_eq!(member.len() - 1, n_leaves + r);
    }

    let mut labels = vec![0usize; n_leaves];
    let mut next = 0usize;
    let mut seen: Vec<(usize, usize)> = Vec::new();
    for leaf in 0..n_leaves {
        let root = find(&mut parent, leaf);
        let label = match seen.iter().find(|&&(r, _)| r == root) {
            Some(&(_, l)) => l,
            None => {
                seen.push((root, next));
                next += 1;
                next - 1
            }
        };
        labels[leaf] = label;
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two tight groups far apart: {0, 1} around 0, {2, 3} around 10.
    fn two_blobs() -> Array2<f64> {
        let pos: [f64; 4] = [0.0, 1.0, 10.0, 11.0];
        let mut d = Array2::zeros((4, 4));
        for i in 0..4 {
            for j in 0..4 {
                d[(i, j)] = (pos[i] - pos[j]).abs();
            }
        }
        d
    }

    #[test]
    fn merge_count_and_final_size() {
        for method in [
            Linkage::Ward,
            Linkage::Single,
            Linkage::Complete,
            Linkage::Average,
        ] {
            let merges = linkage(&two_blobs(), method).unwrap();
            assert_eq!(merges.len(), 3);
            assert_eq!(merges.last().unwrap().size, 4);
        }
    }

    #[test]
    fn tight_pairs_merge_first() {
        let merges = linkage(&two_blobs(), Linkage::Ward).unwrap();
        // both unit-distance pairs merge before the blobs join
        let first_two: Vec<(usize, usize)> =
            merges[..2].iter().map(|m| (m.left, m.right)).collect();
        assert!(first_two.contains(&(0, 1)));
        assert!(first_two.contains(&(2, 3)));
        assert_relative_eq!(merges[0].distance, 1.0, epsilon = 1e-9);
        assert!(merges[2].distance > merges[1].distance);
    }

    #[test]
    fn two_cluster_cut_separates_the_blobs() {
        for method in [Linkage::Ward, Linkage::Single, Linkage::Average] {
            let merges = linkage(&two_blobs(), method).unwrap();
            let labels = cut_at_count(&merges, 4, 2).unwrap();
            assert_eq!(labels[0], labels[1]);
            assert_eq!(labels[2], labels[3]);
            assert_ne!(labels[0], labels[2]);
        }
    }

    #[test]
    fn degenerate_cuts() {
        let merges = linkage(&two_blobs(), Linkage::Ward).unwrap();
        assert_eq!(cut_at_count(&merges, 4, 4).unwrap(), vec![0, 1, 2, 3]);
        let one = cut_at_count(&merges, 4, 1).unwrap();
        assert!(one.iter().all(|&l| l == 0));
        assert!(matches!(
            cut_at_count(&merges, 4, 5),
            Err(ClusterError::BadClusterCount { .. })
        ));
    }
}
