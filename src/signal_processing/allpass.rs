use super::filter::Filter;

/// First-order allpass coefficient for a break frequency
///
/// `tan = tan(π·f/fs)`, `a1 = (tan − 1) / (tan + 1)`. A break frequency of
/// zero gives exactly −1; a quarter of the sample rate gives 0. The value
/// diverges as `break_frequency` approaches Nyquist, callers must keep it
/// strictly below `sample_rate / 2`.
pub fn a1_coefficient(break_frequency: f32, sample_rate: f32) -> f64 {
    let tan = (std::f64::consts::PI * break_frequency as f64 / sample_rate as f64).tan();
    (tan - 1.0) / (tan + 1.0)
}

/// First-order allpass IIR section
///
/// ```text
/// y[n] = a1·x[n] + d
/// d    = x[n] − a1·y[n]
/// ```
///
/// Unit gain at every frequency, phase shift of −90° at the break frequency.
/// The feedback value `d` is carried in `f64`; each output is rounded to
/// `f32` before it feeds the update.
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    a1: f64,
    d: f64,
}

impl AllpassFilter {
    /// Create a new allpass section
    ///
    /// # Arguments
    /// * `break_frequency` - Frequency in Hz where the phase shift is −90°
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(break_frequency: f32, sample_rate: f32) -> Self {
        Self::with_coefficient(a1_coefficient(break_frequency, sample_rate))
    }

    pub fn with_coefficient(a1: f64) -> Self {
        Self { a1, d: 0.0 }
    }

    pub fn coefficient(&self) -> f64 {
        self.a1
    }
}

impl Filter for AllpassFilter {
    fn process(&mut self, sample: f32) -> f32 {
        let x = sample as f64;
        let y = (self.a1 * x + self.d) as f32;
        self.d = x - self.a1 * y as f64;
        y
    }

    fn reset(&mut self) {
        self.d = 0.0;
    }
}

/// Run one fresh allpass pass over `input`
pub fn allpass_filter(input: &[f32], break_frequency: f32, sample_rate: f32) -> Vec<f32> {
    let mut section = AllpassFilter::new(break_frequency, sample_rate);
    let mut output = input.to_vec();
    section.process_buffer(&mut output);
    output
}
