use siglyph_align::{pairwise_distances, Metric, PairwiseConfig};
use siglyph_cluster::{Linkage, PairwiseAnalysis};
use siglyph_core::SymbolicString;

fn family_a(shift: usize) -> SymbolicString {
    // YAZB motifs on a mostly flat background
    let mut s = vec!['_'; 40];
    for (k, c) in "YYAAZZBB".chars().enumerate() {
        s[5 + shift + k] = c;
    }
    SymbolicString::new(s.into_iter().collect::<String>(), 1.0, 0, 0.0).unwrap()
}

fn family_b(shift: usize) -> SymbolicString {
    // C/X plateaus, disjoint alphabet from family A
    let mut s = vec!['_'; 40];
    for (k, c) in "CCCCXXXX".chars().enumerate() {
        s[5 + shift + k] = c;
    }
    SymbolicString::new(s.into_iter().collect::<String>(), 1.0, 0, 0.0).unwrap()
}

#[test]
fn two_families_recovered_from_distances() {
    let sequences = vec![
        ("a0".to_string(), family_a(0)),
        ("a1".to_string(), family_a(3)),
        ("a2".to_string(), family_a(6)),
        ("b0".to_string(), family_b(0)),
        ("b1".to_string(), family_b(3)),
        ("b2".to_string(), family_b(6)),
    ];
    let config = PairwiseConfig {
        metric: Metric::JensenShannon,
        ..Default::default()
    };
    let matrix = pairwise_distances(&sequences, &config).expect("pairwise matrix");

    let analysis = PairwiseAnalysis::new(&matrix, None).expect("embedding succeeds");

    // a single axis should separate two families of this kind
    let best = analysis.best_dimension(0.5).expect("variance curve");
    assert!(best <= 2, "expected a low-dimensional structure, got {best}");

    let labels = analysis
        .clusters(2, best, Linkage::Ward)
        .expect("two clusters");
    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[1], labels[2]);
    assert_eq!(labels[3], labels[4]);
    assert_eq!(labels[4], labels[5]);
    assert_ne!(labels[0], labels[3], "families must separate");

    let reduced = analysis.reduced_distances(best).expect("reduced distances");
    assert_eq!(reduced.dim(), (6, 6));
    // within-family reduced distances stay below the cross-family ones
    assert!(reduced[(0, 1)] < reduced[(0, 3)]);
}
