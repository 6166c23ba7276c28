/// Sine tone of `duration_secs` at `freq_hz` with the given peak amplitude
pub fn sine(freq_hz: f32, amplitude: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32).round() as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            // Phase in f64 keeps long tones clean
            amplitude * ((2.0 * std::f64::consts::PI * freq_hz as f64 * t).sin() as f32)
        })
        .collect()
}

pub fn rms(samples: &[f32]) -> f32 {
    let sum: f64 = samples.iter().map(|&x| x as f64 * x as f64).sum();
    (sum / samples.len().max(1) as f64).sqrt() as f32
}
