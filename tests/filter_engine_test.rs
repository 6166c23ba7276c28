mod test_signals;

use approx::assert_abs_diff_eq;
use micfilter::signal_processing::{
    AllpassBasedFilter, AllpassFilter, Filter, a1_coefficient, allpass_filter, filter,
};
use test_signals::{rms, sine};

const SAMPLE_RATE: u32 = 44100;

#[test]
fn test_voice_band_on_440hz_tone() {
    let input = sine(440.0, 1.0, 1.0, SAMPLE_RATE);
    let output = filter(&input, SAMPLE_RATE as f32, 200.0, 1000.0);

    assert_eq!(output.len(), 44100);
    assert!(output.iter().all(|y| y.is_finite()), "output must be finite");

    // Skip the first 100 ms while both stages settle
    let settle = SAMPLE_RATE as usize / 10;
    let ratio = rms(&output[settle..]) / rms(&input[settle..]);
    assert!(ratio < 1.0, "tone should be attenuated, ratio {}", ratio);
    assert!(ratio > 0.75, "440 Hz sits inside the band, ratio {}", ratio);
}

#[test]
fn test_out_of_band_tones_attenuated_more() {
    let in_band = sine(440.0, 1.0, 0.5, SAMPLE_RATE);
    let below = sine(40.0, 1.0, 0.5, SAMPLE_RATE);
    let above = sine(8000.0, 1.0, 0.5, SAMPLE_RATE);

    let settle = SAMPLE_RATE as usize / 10;
    let gain = |x: &[f32]| {
        let y = filter(x, SAMPLE_RATE as f32, 200.0, 1000.0);
        rms(&y[settle..]) / rms(&x[settle..])
    };

    let pass = gain(&in_band);
    assert!(gain(&below) < pass * 0.5);
    assert!(gain(&above) < pass * 0.5);
}

#[test]
fn test_length_preserved_for_odd_sizes() {
    for len in [1, 3, 255, 4097] {
        let input: Vec<f32> = (0..len).map(|i| ((i * 37) % 11) as f32 / 11.0 - 0.5).collect();
        assert_eq!(filter(&input, 48000.0, 300.0, 3000.0).len(), len);
    }
}

#[test]
fn test_zero_input_zero_output() {
    let zeros = vec![0.0; 1000];
    assert!(allpass_filter(&zeros, 1234.0, 44100.0).iter().all(|&y| y == 0.0));
    assert!(filter(&zeros, 44100.0, 200.0, 1000.0).iter().all(|&y| y == 0.0));
}

#[test]
fn test_coefficient_formula() {
    assert_eq!(a1_coefficient(0.0, 44100.0), -1.0);
    assert_abs_diff_eq!(a1_coefficient(11025.0, 44100.0), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(a1_coefficient(12000.0, 48000.0), 0.0, epsilon = 1e-12);
}

#[test]
fn test_zero_cutoff_allpass_negates() {
    // a1 = -1 keeps the feedback term at zero, leaving y[n] = -x[n]
    let input = sine(300.0, 0.9, 0.01, SAMPLE_RATE);
    let mut section = AllpassFilter::new(0.0, SAMPLE_RATE as f32);
    for &x in &input {
        assert_eq!(section.process(x), -x);
    }

    let passed = AllpassBasedFilter::highpass(0.0, SAMPLE_RATE as f32).apply(&input);
    let blocked = AllpassBasedFilter::lowpass(0.0, SAMPLE_RATE as f32).apply(&input);
    assert_eq!(passed, input);
    assert!(blocked.iter().all(|&y| y == 0.0));
}

#[test]
fn test_lowpass_and_highpass_sum_to_input() {
    let input = sine(700.0, 0.8, 0.1, SAMPLE_RATE);
    for cutoff in [150.0, 700.0, 2000.0] {
        let low = AllpassBasedFilter::lowpass(cutoff, SAMPLE_RATE as f32).apply(&input);
        let high = AllpassBasedFilter::highpass(cutoff, SAMPLE_RATE as f32).apply(&input);
        for ((l, h), x) in low.iter().zip(&high).zip(&input) {
            assert_abs_diff_eq!(l + h, *x, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_swapped_corners_change_output() {
    let input = sine(500.0, 1.0, 0.05, SAMPLE_RATE);
    let forward = filter(&input, SAMPLE_RATE as f32, 200.0, 1000.0);
    let swapped = filter(&input, SAMPLE_RATE as f32, 1000.0, 200.0);
    assert_ne!(forward, swapped);
    assert!(rms(&forward) > rms(&swapped));
}

#[test]
fn test_each_pass_starts_from_zero_state() {
    let input = sine(440.0, 1.0, 0.05, SAMPLE_RATE);
    let first = filter(&input, SAMPLE_RATE as f32, 200.0, 1000.0);
    let second = filter(&input, SAMPLE_RATE as f32, 200.0, 1000.0);
    assert_eq!(first, second);

    let mut stage = AllpassBasedFilter::highpass(200.0, SAMPLE_RATE as f32);
    let mut streamed = input.clone();
    stage.process_buffer(&mut streamed);
    stage.reset();
    let mut again = input.clone();
    stage.process_buffer(&mut again);
    assert_eq!(streamed, again);
}
