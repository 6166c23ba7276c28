pub mod allpass;
pub mod allpass_based;
pub mod engine;
pub mod filter;
pub mod math;

pub use allpass::{AllpassFilter, a1_coefficient, allpass_filter};
pub use allpass_based::{AllpassBasedFilter, FilterKind};
pub use engine::{CutoffControl, Cutoffs, FilterEngine, clamp_cutoff, filter};
pub use filter::Filter;
