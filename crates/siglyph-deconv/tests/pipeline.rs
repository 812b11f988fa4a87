use ndarray::Array1;
use siglyph_core::Signal;
use siglyph_deconv::{deconvolve, ChannelTensorBuilder, DeconvolutionParams};
use siglyph_wavelet::{expand_index, segment_signal};

/// A unit-height peak centred at `centre` over `n` samples.
fn peak_signal(n: usize, centre: f64, width: f64, name: &str) -> Signal {
    let y = Array1::from_iter((0..n).map(|i| {
        (-0.5 * ((i as f64 - centre) / width).powi(2)).exp()
    }));
    Signal::from_range(y, 1.0, name).unwrap()
}

#[test]
fn separated_peaks_deconvolve_into_dominant_sources() {
    // three channels, each carrying one well-separated peak
    let n = 200;
    let centres = [40.0, 100.0, 160.0];
    let mut channels = Vec::new();
    for (i, &c) in centres.iter().enumerate() {
        let signal = peak_signal(n, c, 4.0, &format!("ch{i}"));
        let codes = segment_signal(&signal, &[2]).expect("segmentation");
        channels.push(expand_index(&codes[&2]));
    }
    let t = channels[0].len();
    assert!(channels.iter().all(|ch| ch.len() == t));

    let tensor = ChannelTensorBuilder::new(32)
        .build(&channels)
        .expect("tensor assembly");
    assert_eq!(tensor.dims(), (t, 3, 32));

    let params = DeconvolutionParams::default();
    let out = deconvolve(&tensor, &params).expect("deconvolution");
    let k = out.components.nrows();
    assert!(k >= 1, "at least one latent source");
    assert!(k <= params.max_components);
    assert_eq!(out.sources.dim(), (t, 3, k));
    assert_eq!(out.explained_variance.len(), k);

    // the selection never keeps less than the budget demands
    assert!(
        k >= out.budget_count.min(params.max_components),
        "selected {k} components, budget asked for {}",
        out.budget_count
    );
    let captured: f64 = out.explained_variance.iter().sum();
    assert!(
        captured >= 1.0 - params.variance_loss_budget - 1e-9,
        "selected components capture {captured}, budget allows losing {}",
        params.variance_loss_budget
    );
}

#[test]
fn stacked_layout_gives_same_source_shapes() {
    let n = 120;
    let a = peak_signal(n, 30.0, 3.0, "a");
    let b = peak_signal(n, 80.0, 3.0, "b");
    let channels: Vec<_> = [a, b]
        .iter()
        .map(|s| {
            let codes = segment_signal(s, &[2]).expect("segmentation");
            expand_index(&codes[&2])
        })
        .collect();
    let t = channels[0].len();

    let raster = ChannelTensorBuilder::new(16).build(&channels).unwrap();
    let stacked = ChannelTensorBuilder::new(16)
        .stacked()
        .build(&channels)
        .unwrap();
    let out_r = deconvolve(&raster, &DeconvolutionParams::default()).unwrap();
    let out_s = deconvolve(&stacked, &DeconvolutionParams::default()).unwrap();
    assert_eq!(out_r.sources.dim().0, t);
    assert_eq!(out_s.sources.dim().0, t);
    assert_eq!(out_r.sources.dim().1, 2);
    assert_eq!(out_s.sources.dim().1, 2);
}
