/// Common trait for per-sample audio filters
///
/// Implemented by `AllpassFilter` and `AllpassBasedFilter`.
pub trait Filter {
    /// Process a single sample through the filter
    fn process(&mut self, sample: f32) -> f32;

    /// Clear internal state so the next sample starts a fresh pass
    fn reset(&mut self);

    /// Process a buffer of samples in-place
    fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}
