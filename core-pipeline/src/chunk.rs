//! Re-chunking of arbitrarily sized frames.

use crate::error::PipelineError;

use core_coro::AsyncGenerator;

/// Turns a stream of arbitrarily sized frames into frames of exactly `n`.
///
/// Input frames are concatenated and cut into consecutive runs of `n`
/// values; a trailing run shorter than `n` is dropped when the source ends.
/// Empty input frames are skipped. `n == 0` fails on the first advance with
/// [`PipelineError::InvalidChunkSize`].
pub fn chunked<T>(mut source: AsyncGenerator<Vec<T>>, n: usize) -> AsyncGenerator<Vec<T>>
where
    T: Send + 'static,
{
    AsyncGenerator::new(move |co| async move {
        if n == 0 {
            return Err(anyhow::Error::new(PipelineError::InvalidChunkSize));
        }

        let mut chunk = Vec::with_capacity(n);
        while let Some(frame) = source.next().await? {
            let mut frame = frame.into_iter();
            loop {
                chunk.extend(frame.by_ref().take(n - chunk.len()));
                if chunk.len() < n {
                    break;
                }
                co.yield_value(std::mem::replace(&mut chunk, Vec::with_capacity(n)))
                    .await;
            }
        }

        if !chunk.is_empty() {
            tracing::trace!(dropped = chunk.len(), "Dropping incomplete trailing chunk");
        }
        anyhow::Ok(())
    })
}
