use crate::rational::Rational;

use std::time::Duration;
use thiserror::Error;

/// Failures raised by pipeline stages.
///
/// Stages raise these from inside their generator bodies, so they reach the
/// consumer wrapped in [`core_coro::Error::Body`]; use
/// [`core_coro::Error::downcast_ref`] to get them back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    #[error("Period longer than simulated sample source: {frame_size} samples per frame, {available} available")]
    PeriodTooLong { frame_size: usize, available: usize },

    #[error("Frame period {period:?} holds no samples at {sample_rate} Hz")]
    EmptyFrame { period: Duration, sample_rate: f64 },

    #[error("Capture device failed: {0}")]
    CaptureFailed(String),

    // ========================================================================
    // Stage Errors
    // ========================================================================
    #[error("Chunk size must be greater than 0")]
    InvalidChunkSize,

    #[error("Input timebase is finer resolution than output timebase: {input} < {output}")]
    InputTimebaseTooFine { input: Rational, output: Rational },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
