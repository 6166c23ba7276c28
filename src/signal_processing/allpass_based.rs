use num_complex::Complex64;

use super::allpass::AllpassFilter;
use super::filter::Filter;

/// Response selected from an allpass-based filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Signal plus allpass branch: passes below the cutoff
    Lowpass,
    /// Signal minus allpass branch: passes above the cutoff
    Highpass,
}

/// First-order low-pass or high-pass filter built from an allpass section
///
/// ```text
/// lowpass  = 0.5 · (x + ap(x)) · amplitude
/// highpass = 0.5 · (x − ap(x)) · amplitude
/// ```
///
/// At the cutoff the allpass branch is 90° out of phase with the input, so
/// either response sits at −3 dB there. With matching cutoffs the low-pass
/// and high-pass outputs sum back to the input.
#[derive(Debug, Clone)]
pub struct AllpassBasedFilter {
    allpass: AllpassFilter,
    kind: FilterKind,
    amplitude: f32,
}

impl AllpassBasedFilter {
    pub fn new(kind: FilterKind, cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::with_amplitude(kind, cutoff_hz, sample_rate, 1.0)
    }

    pub fn with_amplitude(kind: FilterKind, cutoff_hz: f32, sample_rate: f32, amplitude: f32) -> Self {
        Self {
            allpass: AllpassFilter::new(cutoff_hz, sample_rate),
            kind,
            amplitude,
        }
    }

    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterKind::Lowpass, cutoff_hz, sample_rate)
    }

    pub fn highpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterKind::Highpass, cutoff_hz, sample_rate)
    }

    /// Gain of the filter at `freq_hz`
    ///
    /// Evaluates `0.5 · (1 ± A(z)) · amplitude` on the unit circle, where
    /// `A(z) = (a1 + z⁻¹) / (1 + a1·z⁻¹)`.
    pub fn magnitude_response(&self, freq_hz: f32, sample_rate: f32) -> f32 {
        let a1 = self.allpass.coefficient();
        let omega = 2.0 * std::f64::consts::PI * freq_hz as f64 / sample_rate as f64;
        let z_inv = Complex64::from_polar(1.0, -omega);
        let allpass = (a1 + z_inv) / (1.0 + a1 * z_inv);
        let branch = match self.kind {
            FilterKind::Lowpass => allpass,
            FilterKind::Highpass => -allpass,
        };
        ((1.0 + branch) * 0.5 * self.amplitude as f64).norm() as f32
    }

    /// Filter a whole buffer starting from zero state
    pub fn apply(&mut self, input: &[f32]) -> Vec<f32> {
        self.reset();
        input.iter().map(|&x| self.process(x)).collect()
    }
}

impl Filter for AllpassBasedFilter {
    fn process(&mut self, sample: f32) -> f32 {
        let ap = self.allpass.process(sample);
        let ap = match self.kind {
            FilterKind::Lowpass => ap,
            FilterKind::Highpass => -ap,
        };
        (sample + ap) * 0.5 * self.amplitude
    }

    fn reset(&mut self) {
        self.allpass.reset();
    }
}
