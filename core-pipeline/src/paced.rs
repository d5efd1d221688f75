use crate::rational::Rational;
use crate::scheduler::FrameScheduler;

use core_coro::executor::SerialExecutor;
use core_coro::AsyncGenerator;

use std::time::Instant;

/// Releases each frame of `frames` at its scheduled render time.
///
/// `frame_period` is the output period in seconds per frame. Frames are
/// pulled from the source as soon as the previous one has been consumed;
/// only the hand-off to the consumer is delayed. Resumption after each wait
/// happens on a [`SerialExecutor`] thread owned by this stage.
pub fn paced_frames<T>(
    frame_period: Rational,
    mut frames: AsyncGenerator<T>,
) -> AsyncGenerator<T>
where
    T: Send + 'static,
{
    AsyncGenerator::new(move |co| async move {
        let mut scheduler = FrameScheduler::new(frame_period);
        let executor = SerialExecutor::new();
        while let Some(frame) = frames.next().await? {
            let render_at = scheduler.schedule(Instant::now());
            executor.sleep_until(render_at).await?;
            co.yield_value(frame).await;
        }
        anyhow::Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_coro::Generator;
    use std::time::Duration;

    #[test]
    fn test_frames_released_at_refresh_rate() {
        let source = AsyncGenerator::from(Generator::from_items(0..4));
        let start = Instant::now();
        let released = paced_frames(Rational::new(1, 100), source)
            .map(move |value| (value, start.elapsed()))
            .collect()
            .wait()
            .unwrap();

        assert_eq!(released.len(), 4);
        for (index, (value, elapsed)) in released.into_iter().enumerate() {
            assert_eq!(value, index as i32);
            assert!(elapsed >= Duration::from_millis(10 * index as u64));
        }
    }

    #[test]
    fn test_empty_source() {
        let source = AsyncGenerator::from(Generator::from_items(Vec::<u8>::new()));
        let values = paced_frames(Rational::new(1, 60), source)
            .collect()
            .wait()
            .unwrap();
        assert!(values.is_empty());
    }
}
