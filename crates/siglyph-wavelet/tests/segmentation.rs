use ndarray::Array1;
use siglyph_core::Signal;
use siglyph_wavelet::{
    baseline_filter, expand_index, segment_signal, segment_transform, BaselineParams,
    MultiscaleTransform,
};

fn flat_ramp_flat() -> Array1<f64> {
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
fn ramp_scenario_end_to_end() {
    let code = segment_transform(&flat_ramp_flat(), 1.0, 0.0, 1).expect("segmentation succeeds");
    assert_eq!(code.letters(), "_A_", "expected flat, crossing, flat");
    let ramp = &code.segments[1];
    assert!(
        (ramp.height - 2.0).abs() < 1e-9,
        "crossing height should be 2, got {}",
        ramp.height
    );

    let full = expand_index(&code);
    assert_eq!(full.len(), 100, "index expansion covers every sample");
    assert_eq!(full.symbols().matches('A').count(), 20);
}

#[test]
fn gaussian_peak_produces_crossing_pair() {
    let y = Array1::from_iter(
        (0..256).map(|i| (-0.5 * ((i as f64 - 128.0) / 6.0).powi(2)).exp()),
    );
    let signal = Signal::from_range(y, 1.0, "peak").unwrap();
    let codes = segment_signal(&signal, &[2, 4]).expect("transform and segment");
    for scale in [2u32, 4] {
        let letters = codes[&scale].letters();
        assert!(
            letters.contains('A') && letters.contains('Z'),
            "scale {scale}: a peak response must rise through zero and fall back, got {letters}"
        );
        let a = letters.find('A').unwrap();
        let z = letters.find('Z').unwrap();
        assert!(a < z, "upward crossing precedes downward at scale {scale}");
    }
}

#[test]
fn baseline_filter_then_transform_keeps_peak_response() {
    let mut y = Array1::from_elem(400, 2.0);
    for i in 180..220 {
        let u = (i as f64 - 200.0) / 5.0;
        y[i] += 50.0 * (-0.5 * u * u).exp();
    }
    let params = BaselineParams {
        window: Some(41),
        ..Default::default()
    };
    let filtered = baseline_filter(&y, params).expect("filtering succeeds");
    assert!(filtered[0].abs() < 1e-9, "flat region is suppressed");
    assert!(filtered[200] > 25.0, "peak survives the filter");

    let signal = Signal::from_range(filtered, 1.0, "filtered").unwrap();
    let transformer = MultiscaleTransform::new(vec![4]).unwrap();
    let out = transformer.transform(&signal).unwrap();
    assert!(
        out.get(4).unwrap()[200] > 0.0,
        "transform still responds at the peak centre"
    );
}
