use std::sync::atomic::{AtomicU64, Ordering};

use super::allpass_based::{AllpassBasedFilter, FilterKind};

/// High-pass and low-pass corner frequencies in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoffs {
    pub highpass_hz: f32,
    pub lowpass_hz: f32,
}

impl Cutoffs {
    pub fn new(highpass_hz: f32, lowpass_hz: f32) -> Self {
        Self {
            highpass_hz,
            lowpass_hz,
        }
    }

    /// Limit both corners to `[0, max_hz]` and strictly below Nyquist
    pub fn clamped(self, max_hz: f32, sample_rate: f32) -> Self {
        Self {
            highpass_hz: clamp_cutoff(self.highpass_hz, max_hz, sample_rate),
            lowpass_hz: clamp_cutoff(self.lowpass_hz, max_hz, sample_rate),
        }
    }

    fn to_bits(self) -> u64 {
        ((self.highpass_hz.to_bits() as u64) << 32) | self.lowpass_hz.to_bits() as u64
    }

    fn from_bits(bits: u64) -> Self {
        Self {
            highpass_hz: f32::from_bits((bits >> 32) as u32),
            lowpass_hz: f32::from_bits(bits as u32),
        }
    }
}

impl Default for Cutoffs {
    fn default() -> Self {
        Self::new(200.0, 1000.0)
    }
}

/// Clamp a cutoff into `[0, max_hz]` and strictly below `sample_rate / 2`
pub fn clamp_cutoff(cutoff_hz: f32, max_hz: f32, sample_rate: f32) -> f32 {
    let nyquist = sample_rate / 2.0;
    let upper = max_hz.min(nyquist * (1.0 - f32::EPSILON)).max(0.0);
    if cutoff_hz.is_nan() {
        return 0.0;
    }
    cutoff_hz.clamp(0.0, upper)
}

/// Cutoff pair shared between the presentation layer and the filter
///
/// Both corners live in a single atomic word, so `snapshot` always returns
/// a pair written by one update.
#[derive(Debug)]
pub struct CutoffControl {
    bits: AtomicU64,
    max_hz: f32,
    sample_rate: f32,
}

impl CutoffControl {
    /// Create a control whose setters clamp to `[0, max_hz]` below Nyquist
    pub fn new(initial: Cutoffs, max_hz: f32, sample_rate: f32) -> Self {
        let initial = initial.clamped(max_hz, sample_rate);
        Self {
            bits: AtomicU64::new(initial.to_bits()),
            max_hz,
            sample_rate,
        }
    }

    pub fn snapshot(&self) -> Cutoffs {
        Cutoffs::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Store both corners at once, returning the clamped pair
    pub fn set(&self, cutoffs: Cutoffs) -> Cutoffs {
        let cutoffs = cutoffs.clamped(self.max_hz, self.sample_rate);
        self.bits.store(cutoffs.to_bits(), Ordering::Release);
        cutoffs
    }

    pub fn set_highpass(&self, hz: f32) -> f32 {
        let hz = clamp_cutoff(hz, self.max_hz, self.sample_rate);
        self.update(|c| Cutoffs { highpass_hz: hz, ..c });
        hz
    }

    pub fn set_lowpass(&self, hz: f32) -> f32 {
        let hz = clamp_cutoff(hz, self.max_hz, self.sample_rate);
        self.update(|c| Cutoffs { lowpass_hz: hz, ..c });
        hz
    }

    pub fn max_hz(&self) -> f32 {
        self.max_hz
    }

    fn update(&self, f: impl Fn(Cutoffs) -> Cutoffs) {
        // Closure never returns None, so fetch_update cannot fail.
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some(f(Cutoffs::from_bits(bits)).to_bits())
            });
    }
}

/// Cascade a high-pass stage and a low-pass stage over `raw`
///
/// The high-pass stage (corner `highpass_cutoff`) runs first, the low-pass
/// stage (corner `lowpass_cutoff`) runs on its output. Each stage starts
/// from zero state. The output has the same length as the input.
/// `highpass_cutoff >= lowpass_cutoff` is accepted as is. Neither cutoff is
/// clamped; both must be below `sample_rate / 2`.
pub fn filter(raw: &[f32], sample_rate: f32, highpass_cutoff: f32, lowpass_cutoff: f32) -> Vec<f32> {
    filter_with_amplitude(raw, sample_rate, highpass_cutoff, lowpass_cutoff, 1.0)
}

pub fn filter_with_amplitude(
    raw: &[f32],
    sample_rate: f32,
    highpass_cutoff: f32,
    lowpass_cutoff: f32,
    amplitude: f32,
) -> Vec<f32> {
    let highpassed =
        AllpassBasedFilter::with_amplitude(FilterKind::Highpass, highpass_cutoff, sample_rate, amplitude)
            .apply(raw);
    AllpassBasedFilter::with_amplitude(FilterKind::Lowpass, lowpass_cutoff, sample_rate, amplitude)
        .apply(&highpassed)
}

/// Band filter over whole recordings, reading live cutoffs
pub struct FilterEngine {
    sample_rate: f32,
    amplitude: f32,
    cutoffs: std::sync::Arc<CutoffControl>,
}

impl FilterEngine {
    pub fn new(sample_rate: f32, amplitude: f32, cutoffs: std::sync::Arc<CutoffControl>) -> Self {
        Self {
            sample_rate,
            amplitude,
            cutoffs,
        }
    }

    /// Filter a finished buffer with the cutoffs current at call time
    ///
    /// Returns the filtered samples together with the cutoff snapshot that
    /// produced them.
    pub fn process(&self, raw: &[f32]) -> (Vec<f32>, Cutoffs) {
        let cutoffs = self.cutoffs.snapshot();
        log::debug!(
            "Filtering {} samples: highpass {:.1} Hz, lowpass {:.1} Hz",
            raw.len(),
            cutoffs.highpass_hz,
            cutoffs.lowpass_hz
        );
        let filtered = filter_with_amplitude(
            raw,
            self.sample_rate,
            cutoffs.highpass_hz,
            cutoffs.lowpass_hz,
            self.amplitude,
        );
        (filtered, cutoffs)
    }

    pub fn cutoffs(&self) -> &std::sync::Arc<CutoffControl> {
        &self.cutoffs
    }
}
