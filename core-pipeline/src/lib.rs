//! # Spectrogram Pipeline Stages
//!
//! Stages of the capture → analysis → rendering pipeline, each an
//! [`AsyncGenerator`](core_coro::AsyncGenerator) transformer that pulls from
//! its source only when its own consumer pulls from it.
//!
//! ## Overview
//!
//! - `source`: simulated sample sources, optionally paced in real time
//! - `capture`: bridge from a device callback thread into the pipeline
//! - `chunk`: re-chunking into fixed-size analysis windows
//! - `levels`: per-frame RMS level meter
//! - `interpolate`: frame-rate conversion between timebases
//! - `scheduler`, `paced`: holding frames to a display refresh rate
//! - `rational`: exact timebases
//!
//! ## Usage
//!
//! ```rust
//! use core_pipeline::{chunked, levels, ramp_source, RampSourceOptions};
//!
//! let meter = ramp_source(RampSourceOptions::default())
//!     .pipe(|frames| chunked(frames, 2048))
//!     .pipe(levels);
//!
//! let first: Vec<f64> = meter.into_blocking_iter().take(3).map(Result::unwrap).collect();
//! assert!(first.iter().all(|level| *level > 0.5 && *level < 0.8));
//! ```

pub mod capture;
pub mod chunk;
pub mod error;
pub mod interpolate;
pub mod levels;
pub mod paced;
pub mod rational;
pub mod scheduler;
pub mod source;

pub use capture::{capture_channel, CaptureFeed, CaptureSource};
pub use chunk::chunked;
pub use error::{PipelineError, Result};
pub use interpolate::{interpolate, lerp_frames};
pub use levels::{levels, rms};
pub use paced::paced_frames;
pub use rational::Rational;
pub use scheduler::FrameScheduler;
pub use source::{ramp_samples, ramp_source, sample_source, RampSourceOptions};
