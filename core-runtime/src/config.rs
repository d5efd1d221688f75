//! # Pipeline Configuration
//!
//! Settings for the capture → analysis → rendering pipeline.
//!
//! ## Overview
//!
//! [`PipelineConfig`] is built through [`PipelineConfigBuilder`] or loaded
//! from JSON. Both paths run the same fail-fast [`PipelineConfig::validate`],
//! so a config that exists is a config the pipeline stages can use without
//! rechecking.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::{PipelineConfig, SourcePacing};
//!
//! let config = PipelineConfig::builder()
//!     .sample_rate(24_000.0)
//!     .fft_window_size(2048)
//!     .refresh_rate_hz(60)
//!     .pacing(SourcePacing::RealTime)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.frame_size(), 240);
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use core_runtime::config::PipelineConfig;
//!
//! // FFT windows must have an even length.
//! let result = PipelineConfig::builder().fft_window_size(1023).build();
//! assert!(result.is_err());
//! ```

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};

use std::time::Duration;

/// How simulated sources release their frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePacing {
    /// Frames are produced as fast as the consumer pulls them.
    #[default]
    Instant,
    /// Each frame is held back until its real-time capture instant.
    RealTime,
}

/// Frequency sweep used by the ramp test source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    /// Length of one sweep in milliseconds
    pub period_ms: u64,
    /// Sweep start frequency in Hz
    pub frequency_min: f64,
    /// Sweep end frequency in Hz (exclusive)
    pub frequency_max: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            period_ms: 1_000,
            frequency_min: 1_000.0,
            frequency_max: 10_000.0,
        }
    }
}

/// Settings shared by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capture sample rate in Hz
    pub sample_rate: f64,

    /// Samples per analysis window; must be even
    pub fft_window_size: usize,

    /// Period of one source frame in milliseconds
    pub frame_period_ms: u64,

    /// Display refresh rate in frames per second
    pub refresh_rate_hz: u32,

    /// Pacing of simulated sources
    pub pacing: SourcePacing,

    /// Ramp source sweep
    pub ramp: RampConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000.0,
            fft_window_size: 2048,
            frame_period_ms: 10,
            refresh_rate_hz: 60,
            pacing: SourcePacing::Instant,
            ramp: RampConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new builder starting from the defaults.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid pipeline config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the config as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("Failed to serialize pipeline config: {}", e)))
    }

    /// Source frame period as a `Duration`.
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms)
    }

    /// Samples in one source frame, rounded down.
    pub fn frame_size(&self) -> usize {
        (self.sample_rate * self.frame_period().as_secs_f64()) as usize
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Sample rate is positive and finite
    /// - FFT window size is non-zero and even
    /// - A source frame holds at least one sample
    /// - Refresh rate is non-zero
    /// - Ramp frequencies form a non-empty range
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::Config(format!(
                "Sample rate must be a positive number of Hz. Got: {}",
                self.sample_rate
            )));
        }

        if self.fft_window_size == 0 {
            return Err(Error::Config("FFT window size must be greater than 0".to_string()));
        }

        if self.fft_window_size % 2 != 0 {
            return Err(Error::Config(format!(
                "FFT length must be even. Got: {}",
                self.fft_window_size
            )));
        }

        if self.frame_size() == 0 {
            return Err(Error::Config(format!(
                "Frame period of {}ms holds no samples at {} Hz",
                self.frame_period_ms, self.sample_rate
            )));
        }

        if self.refresh_rate_hz == 0 {
            return Err(Error::Config("Refresh rate must be greater than 0 Hz".to_string()));
        }

        if self.ramp.period_ms == 0 {
            return Err(Error::Config("Ramp period must be greater than 0ms".to_string()));
        }

        if !(self.ramp.frequency_min >= 0.0 && self.ramp.frequency_min < self.ramp.frequency_max) {
            return Err(Error::Config(format!(
                "Ramp frequency range [{}, {}) is empty",
                self.ramp.frequency_min, self.ramp.frequency_max
            )));
        }

        Ok(())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Sets the capture sample rate in Hz.
    pub fn sample_rate(mut self, hz: f64) -> Self {
        self.config.sample_rate = hz;
        self
    }

    /// Sets the analysis window size.
    pub fn fft_window_size(mut self, samples: usize) -> Self {
        self.config.fft_window_size = samples;
        self
    }

    /// Sets the source frame period.
    pub fn frame_period(mut self, period: Duration) -> Self {
        self.config.frame_period_ms = period.as_millis() as u64;
        self
    }

    /// Sets the display refresh rate.
    pub fn refresh_rate_hz(mut self, hz: u32) -> Self {
        self.config.refresh_rate_hz = hz;
        self
    }

    /// Sets how simulated sources are paced.
    pub fn pacing(mut self, pacing: SourcePacing) -> Self {
        self.config.pacing = pacing;
        self
    }

    /// Sets the ramp source sweep.
    pub fn ramp(mut self, ramp: RampConfig) -> Self {
        self.config.ramp = ramp;
        self
    }

    /// Builds the config, failing fast on invalid settings.
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        tracing::debug!(config = ?self.config, "Pipeline config built");
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sample_rate, 24_000.0);
        assert_eq!(config.fft_window_size, 2048);
        assert_eq!(config.frame_size(), 240);
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::builder()
            .sample_rate(48_000.0)
            .fft_window_size(1024)
            .frame_period(Duration::from_millis(20))
            .refresh_rate_hz(30)
            .pacing(SourcePacing::RealTime)
            .build()
            .unwrap();

        assert_eq!(config.frame_size(), 960);
        assert_eq!(config.refresh_rate_hz, 30);
        assert_eq!(config.pacing, SourcePacing::RealTime);
    }

    #[test]
    fn test_odd_fft_window_rejected() {
        let error = PipelineConfig::builder().fft_window_size(1023).build().unwrap_err();
        assert!(error.to_string().contains("FFT length must be even"));
    }

    #[test]
    fn test_zero_refresh_rate_rejected() {
        assert!(matches!(
            PipelineConfig::builder().refresh_rate_hz(0).build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_invalid_sample_rate_rejected() {
        assert!(PipelineConfig::builder().sample_rate(0.0).build().is_err());
        assert!(PipelineConfig::builder().sample_rate(f64::NAN).build().is_err());
    }

    #[test]
    fn test_empty_frame_rejected() {
        let result = PipelineConfig::builder()
            .sample_rate(10.0)
            .frame_period(Duration::from_millis(10))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_ramp_rejected() {
        let ramp = RampConfig {
            frequency_min: 5_000.0,
            frequency_max: 100.0,
            ..RampConfig::default()
        };
        assert!(PipelineConfig::builder().ramp(ramp).build().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "fft_window_size": 512, "pacing": "real_time", "ramp": { "period_ms": 10000 } }"#,
        )
        .unwrap();
        assert_eq!(config.fft_window_size, 512);
        assert_eq!(config.pacing, SourcePacing::RealTime);
        assert_eq!(config.ramp.period_ms, 10_000);
        assert_eq!(config.ramp.frequency_min, 1_000.0);
        assert_eq!(config.sample_rate, 24_000.0);
    }

    #[test]
    fn test_from_json_validates() {
        let result = PipelineConfig::from_json(r#"{ "fft_window_size": 7 }"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::builder().refresh_rate_hz(144).build().unwrap();
        let json = config.to_json().unwrap();
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }
}
