//! Configuration for the microphone filter.
//!
//! Defaults match the reference setup: 44.1 kHz mono capture, high-pass
//! corner 200 Hz, low-pass corner 1000 Hz, both adjustable in `[0, 2000]` Hz.
//!
//! A TOML file may override any subset of fields:
//!
//! ```toml
//! [audio]
//! sample_rate = 48000
//!
//! [filter]
//! highpass_cutoff = 150.0
//! lowpass_cutoff = 1800.0
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{FilterError, Result};
use crate::signal_processing::{CutoffControl, Cutoffs};

/// Cutoff frequency value for command-line flags
///
/// # Parsing formats
/// - `200` - frequency in Hz (no suffix)
/// - `200hz` or `200Hz` - frequency in Hz (explicit)
/// - `1.2khz` or `1.2kHz` - frequency in kHz
///
/// # Example
/// ```
/// use micfilter::config::Cutoff;
///
/// let cutoff: Cutoff = "1.5khz".parse().unwrap();
/// assert_eq!(cutoff.as_hz(), 1500.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff(f32);

impl Cutoff {
    pub fn from_hz(hz: f32) -> Self {
        Self(hz)
    }

    pub fn as_hz(&self) -> f32 {
        self.0
    }
}

impl FromStr for Cutoff {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();

        let (num, scale) = if let Some(num) = lower.strip_suffix("khz") {
            (num, 1000.0)
        } else if let Some(num) = lower.strip_suffix("hz") {
            (num, 1.0)
        } else {
            (lower.as_str(), 1.0)
        };

        let value: f32 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid frequency: {}", s))?;
        if !value.is_finite() || value < 0.0 {
            return Err("frequency must be zero or positive".to_string());
        }
        Ok(Self::from_hz(value * scale))
    }
}

/// Top-level configuration
///
/// # Example
/// ```
/// use micfilter::config::AppConfig;
///
/// let mut config = AppConfig::default();
/// config.filter.lowpass_cutoff = 1500.0;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Audio capture configuration
    pub audio: AudioConfig,
    /// Band filter configuration
    pub filter: FilterConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz, fixed for the lifetime of a recording
    pub sample_rate: u32,
    /// Requested frames per capture callback
    pub buffer_size: usize,
    /// Number of input channels requested from the device; channel 0 is recorded
    pub channels: u16,
}

/// Cascaded high-pass/low-pass filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Initial high-pass corner in Hz
    pub highpass_cutoff: f32,
    /// Initial low-pass corner in Hz
    pub lowpass_cutoff: f32,
    /// Upper bound for either corner when adjusted at runtime
    pub max_cutoff: f32,
    /// Output gain applied by each stage
    pub amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 1024,
            channels: 1,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            highpass_cutoff: 200.0,
            lowpass_cutoff: 1000.0,
            max_cutoff: 2000.0,
            amplitude: 1.0,
        }
    }
}

impl FilterConfig {
    pub fn cutoffs(&self) -> Cutoffs {
        Cutoffs::new(self.highpass_cutoff, self.lowpass_cutoff)
    }

    /// Build the shared cutoff control for a given sample rate
    pub fn cutoff_control(&self, sample_rate: u32) -> CutoffControl {
        CutoffControl::new(self.cutoffs(), self.max_cutoff, sample_rate as f32)
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| FilterError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    /// Check that every cutoff stays in range and below Nyquist
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(FilterError::Config("sample rate must be positive".into()));
        }
        if self.audio.channels == 0 {
            return Err(FilterError::Config("at least one channel is required".into()));
        }

        let nyquist = self.audio.sample_rate as f32 / 2.0;
        let filter = &self.filter;
        if !(filter.max_cutoff > 0.0 && filter.max_cutoff < nyquist) {
            return Err(FilterError::Config(format!(
                "max cutoff {} Hz must be in (0, {}) Hz",
                filter.max_cutoff, nyquist
            )));
        }
        for (name, value) in [
            ("highpass", filter.highpass_cutoff),
            ("lowpass", filter.lowpass_cutoff),
        ] {
            if !(0.0..=filter.max_cutoff).contains(&value) {
                return Err(FilterError::Config(format!(
                    "{} cutoff {} Hz outside [0, {}] Hz",
                    name, value, filter.max_cutoff
                )));
            }
        }
        if !filter.amplitude.is_finite() {
            return Err(FilterError::Config("amplitude must be finite".into()));
        }
        if filter.highpass_cutoff >= filter.lowpass_cutoff {
            log::warn!(
                "High-pass cutoff {} Hz is not below low-pass cutoff {} Hz; passband is empty",
                filter.highpass_cutoff,
                filter.lowpass_cutoff
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_plain_and_hz() {
        assert_eq!("200".parse::<Cutoff>().unwrap().as_hz(), 200.0);
        assert_eq!("200hz".parse::<Cutoff>().unwrap().as_hz(), 200.0);
        assert_eq!("200Hz".parse::<Cutoff>().unwrap().as_hz(), 200.0);
    }

    #[test]
    fn test_cutoff_khz() {
        assert_eq!("1.5kHz".parse::<Cutoff>().unwrap().as_hz(), 1500.0);
        assert_eq!(" 2khz ".parse::<Cutoff>().unwrap().as_hz(), 2000.0);
    }

    #[test]
    fn test_cutoff_invalid() {
        assert!("abc".parse::<Cutoff>().is_err());
        assert!("-100hz".parse::<Cutoff>().is_err());
        assert!("inf".parse::<Cutoff>().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.filter.cutoffs(), Cutoffs::new(200.0, 1000.0));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [filter]
            lowpass_cutoff = 1500.0
            "#,
        )
        .unwrap();
        assert_eq!(config.filter.lowpass_cutoff, 1500.0);
        assert_eq!(config.filter.highpass_cutoff, 200.0);
        assert_eq!(config.audio.sample_rate, 44100);
    }

    #[test]
    fn test_max_cutoff_must_stay_below_nyquist() {
        let result = AppConfig::from_toml_str(
            r#"
            [audio]
            sample_rate = 8000

            [filter]
            max_cutoff = 4000.0
            "#,
        );
        assert!(matches!(result, Err(FilterError::Config(_))));
    }

    #[test]
    fn test_cutoff_above_max_rejected() {
        let mut config = AppConfig::default();
        config.filter.highpass_cutoff = 2500.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_band_is_accepted() {
        let mut config = AppConfig::default();
        config.filter.highpass_cutoff = 1200.0;
        config.filter.lowpass_cutoff = 300.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(AppConfig::from_toml_str("[filter\nlowpass_cutoff = ").is_err());
    }
}
