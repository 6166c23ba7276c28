/// Root-mean-square level of a buffer (0.0 for an empty buffer)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&x| x as f64 * x as f64).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Largest absolute sample value
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, &x| acc.max(x.abs()))
}

/// Level ratio in decibels, `-inf` when `reference` is silent
pub fn gain_db(level: f32, reference: f32) -> f32 {
    if reference <= 0.0 {
        return f32::NEG_INFINITY;
    }
    20.0 * (level / reference).log10()
}
