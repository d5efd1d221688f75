//! # Simulated Sample Sources
//!
//! Sources that replay a table of samples as a stream of capture frames.
//!
//! ## Overview
//!
//! [`sample_source`] cuts a sample table into frames of
//! `floor(sample_rate * period)` samples, wrapping around at the end of the
//! table so the stream never ends. With [`SourcePacing::RealTime`] each frame
//! is held back until `epoch + frame_number * period`, where the epoch is the
//! instant the first frame was requested; the body resumes on a
//! [`SerialExecutor`] thread owned by the source.
//!
//! [`ramp_source`] feeds [`sample_source`] with a synthetic sine sweep, which
//! makes the spectrogram draw a diagonal line.

use crate::error::PipelineError;

use core_coro::executor::SerialExecutor;
use core_coro::AsyncGenerator;
use core_runtime::config::{PipelineConfig, SourcePacing};

use std::f32::consts::PI;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Options for [`ramp_source`].
///
/// The sweep covers `[frequency_min, frequency_max)` over `ramp_period`, then
/// starts again.
#[derive(Debug, Clone, PartialEq)]
pub struct RampSourceOptions {
    pub sample_rate: f64,
    pub frame_period: Duration,
    pub ramp_period: Duration,
    pub frequency_min: f64,
    pub frequency_max: f64,
    pub pacing: SourcePacing,
}

impl Default for RampSourceOptions {
    fn default() -> Self {
        Self {
            sample_rate: 24_000.0,
            frame_period: Duration::from_millis(10),
            ramp_period: Duration::from_secs(1),
            frequency_min: 1_000.0,
            frequency_max: 10_000.0,
            pacing: SourcePacing::Instant,
        }
    }
}

impl RampSourceOptions {
    /// Takes every option from a validated pipeline config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            frame_period: config.frame_period(),
            ramp_period: Duration::from_millis(config.ramp.period_ms),
            frequency_min: config.ramp.frequency_min,
            frequency_max: config.ramp.frequency_max,
            pacing: config.pacing,
        }
    }

    pub fn with_pacing(mut self, pacing: SourcePacing) -> Self {
        self.pacing = pacing;
        self
    }
}

/// Synthesizes one sweep of a sine whose frequency rises linearly.
pub fn ramp_samples(options: &RampSourceOptions) -> Vec<i16> {
    let size = (options.sample_rate * options.ramp_period.as_secs_f64()) as usize;
    let f_min = options.frequency_min as f32;
    let f_max = options.frequency_max as f32;
    let sample_rate = options.sample_rate as f32;

    let mut samples = vec![0_i16; size];
    // The final sample stays at zero so consecutive sweeps join without a step.
    for (t, sample) in samples.iter_mut().enumerate().take(size.saturating_sub(1)) {
        let progress = t as f32 / size as f32;
        let frequency = f_min + (f_max - f_min) * progress;
        let value = (2.0 * PI * frequency * (t as f32 / sample_rate)).sin();
        *sample = (i16::MAX as f32 * value) as i16;
    }
    samples
}

/// Copies `count` samples starting at `start`, wrapping around the table.
fn periodic_window(samples: &[i16], start: usize, count: usize) -> Vec<i16> {
    let start = start % samples.len();
    let end = (start + count).min(samples.len());

    let mut window = Vec::with_capacity(count);
    window.extend_from_slice(&samples[start..end]);
    window.extend_from_slice(&samples[..count - (end - start)]);
    window
}

/// Replays `samples` as an endless stream of frames covering `period` each.
///
/// Fails on the first advance with [`PipelineError::PeriodTooLong`] when one
/// frame needs more samples than the table holds, or
/// [`PipelineError::EmptyFrame`] when it needs none.
pub fn sample_source(
    samples: Arc<[i16]>,
    sample_rate: f64,
    period: Duration,
    pacing: SourcePacing,
) -> AsyncGenerator<Vec<i16>> {
    AsyncGenerator::new(move |co| async move {
        let frame_size = (sample_rate * period.as_secs_f64()) as usize;
        if frame_size == 0 {
            return Err(anyhow::Error::new(PipelineError::EmptyFrame {
                period,
                sample_rate,
            }));
        }
        if frame_size > samples.len() {
            return Err(anyhow::Error::new(PipelineError::PeriodTooLong {
                frame_size,
                available: samples.len(),
            }));
        }

        let executor = match pacing {
            SourcePacing::RealTime => Some(SerialExecutor::new()),
            SourcePacing::Instant => None,
        };
        tracing::debug!(frame_size, ?pacing, "Sample source started");

        let epoch = Instant::now();
        for frame_number in 0_u32.. {
            if let Some(executor) = &executor {
                executor.sleep_until(epoch + period * frame_number).await?;
            }
            let start = frame_number as usize * frame_size;
            co.yield_value(periodic_window(&samples, start, frame_size))
                .await;
        }
        anyhow::Ok(())
    })
}

/// An endless frequency sweep, framed and paced per `options`.
pub fn ramp_source(options: RampSourceOptions) -> AsyncGenerator<Vec<i16>> {
    let samples: Arc<[i16]> = ramp_samples(&options).into();
    sample_source(samples, options.sample_rate, options.frame_period, options.pacing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(len: i16) -> Arc<[i16]> {
        (0..len).collect::<Vec<_>>().into()
    }

    #[test]
    fn test_periodic_window_wraps() {
        let samples = [0, 1, 2, 3, 4];
        assert_eq!(periodic_window(&samples, 3, 4), vec![3, 4, 0, 1]);
        assert_eq!(periodic_window(&samples, 7, 2), vec![2, 3]);
        assert_eq!(periodic_window(&samples, 0, 5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_frames_wrap_around_table() {
        // 1000 Hz * 3ms = 3 samples per frame
        let mut source = sample_source(
            table(5),
            1_000.0,
            Duration::from_millis(3),
            SourcePacing::Instant,
        );
        let frames: Vec<Vec<i16>> = (0..4)
            .map(|_| source.next().wait().unwrap().unwrap())
            .collect();
        assert_eq!(
            frames,
            vec![vec![0, 1, 2], vec![3, 4, 0], vec![1, 2, 3], vec![4, 0, 1]]
        );
    }

    #[test]
    fn test_period_too_long() {
        let mut source = sample_source(
            table(5),
            1_000.0,
            Duration::from_millis(6),
            SourcePacing::Instant,
        );
        let error = source.next().wait().unwrap_err();
        assert_eq!(
            error.downcast_ref::<PipelineError>(),
            Some(&PipelineError::PeriodTooLong {
                frame_size: 6,
                available: 5
            })
        );
    }

    #[test]
    fn test_empty_frame_rejected() {
        let mut source = sample_source(
            table(5),
            100.0,
            Duration::from_millis(1),
            SourcePacing::Instant,
        );
        let error = source.next().wait().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<PipelineError>(),
            Some(PipelineError::EmptyFrame { .. })
        ));
    }

    #[test]
    fn test_real_time_pacing() {
        let mut source = sample_source(
            table(100),
            1_000.0,
            Duration::from_millis(10),
            SourcePacing::RealTime,
        );
        let start = Instant::now();
        for _ in 0..4 {
            source.next().wait().unwrap().unwrap();
        }
        // Frames 0..=3 are released at 0, 10, 20 and 30ms.
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_ramp_samples_shape() {
        let options = RampSourceOptions {
            sample_rate: 1_000.0,
            ramp_period: Duration::from_millis(500),
            frequency_min: 10.0,
            frequency_max: 100.0,
            ..RampSourceOptions::default()
        };
        let samples = ramp_samples(&options);
        assert_eq!(samples.len(), 500);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[499], 0);
        assert!(samples.iter().any(|&s| s > i16::MAX / 2));
        assert!(samples.iter().any(|&s| s < i16::MIN / 2));
    }

    #[test]
    fn test_ramp_source_frame_size() {
        let mut source = ramp_source(RampSourceOptions::default());
        let frame = source.next().wait().unwrap().unwrap();
        // 24kHz * 10ms
        assert_eq!(frame.len(), 240);
    }

    #[test]
    fn test_options_from_config() {
        let config = PipelineConfig::builder()
            .pacing(SourcePacing::RealTime)
            .build()
            .unwrap();
        let options = RampSourceOptions::from_config(&config);
        assert_eq!(
            options,
            RampSourceOptions::default().with_pacing(SourcePacing::RealTime)
        );
    }
}
