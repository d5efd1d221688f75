//! Frame-rate conversion by blending adjacent frames.

use crate::error::PipelineError;
use crate::rational::Rational;

use core_coro::AsyncGenerator;

/// Resamples `source` from `input_timebase` to `output_timebase`.
///
/// Both timebases are frame periods in seconds. Input frame `n` covers
/// `[n * input, (n + 1) * input]`; every output frame whose start time falls
/// in that span is produced by `blend(t, frame_n, frame_n_plus_1)` with `t`
/// the position of the output frame within the span, in `[0, 1]`.
///
/// At least two input frames are needed before anything is produced. An
/// input timebase finer than the output timebase fails on the first advance
/// with [`PipelineError::InputTimebaseTooFine`].
pub fn interpolate<T, B>(
    mut source: AsyncGenerator<T>,
    input_timebase: Rational,
    output_timebase: Rational,
    mut blend: B,
) -> AsyncGenerator<T>
where
    T: Send + 'static,
    B: FnMut(f64, &T, &T) -> T + Send + 'static,
{
    AsyncGenerator::new(move |co| async move {
        if input_timebase.to_f64() < output_timebase.to_f64() {
            return Err(anyhow::Error::new(PipelineError::InputTimebaseTooFine {
                input: input_timebase,
                output: output_timebase,
            }));
        }

        let Some(mut older) = source.next().await? else {
            return anyhow::Ok(());
        };
        let Some(mut newer) = source.next().await? else {
            return anyhow::Ok(());
        };

        let mut output_frame_number: i64 = 0;
        for input_frame_number in 0_i64.. {
            let input_start = (input_timebase * input_frame_number).to_f64();
            let input_end = (input_timebase * (input_frame_number + 1)).to_f64();
            let input_duration = input_end - input_start;

            loop {
                let output_start = (output_timebase * output_frame_number).to_f64();
                if output_start > input_end {
                    break;
                }
                let t = (output_start - input_start) / input_duration;
                co.yield_value(blend(t, &older, &newer)).await;
                output_frame_number += 1;
            }

            match source.next().await? {
                Some(next) => older = std::mem::replace(&mut newer, next),
                None => break,
            }
        }
        anyhow::Ok(())
    })
}

/// Linear blend of two equally sized frames.
pub fn lerp_frames(t: f64, a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter()
        .zip(b)
        .map(|(a, b)| a + (b - a) * t)
        .collect()
}
