//! # Async Generators
//!
//! Pull-based, lazily evaluated producers of many values.
//!
//! ## Overview
//!
//! An [`AsyncGenerator`] is the multi-value counterpart of a
//! [`Task`](crate::Task). Its body receives a [`Yielder`] and alternates
//! between handing values to the consumer and awaiting other work (timers,
//! device callbacks, upstream generators). Nothing runs until the consumer
//! advances; the body never runs ahead of its consumer, so at most one value
//! is ever in flight.
//!
//! ## State machine
//!
//! ```text
//! NotStarted --advance--> Yielded <--advance--> Awaiting
//!      \                     |                     |
//!       +--------------------+---------------------+--> Exhausted | Failed
//! ```
//!
//! - A natural completion makes the generator `Exhausted`; every later
//!   advance returns `Ok(None)`.
//! - A body failure is reported by the advance that observes it; later
//!   advances return [`Error::AlreadyFailed`](crate::Error::AlreadyFailed).
//!
//! ## Consuming
//!
//! ```rust
//! use core_coro::{AsyncGenerator, Task, Yielder};
//!
//! async fn countdown(co: Yielder<u32>) -> anyhow::Result<()> {
//!     for i in (1..=3).rev() {
//!         co.yield_value(i).await;
//!     }
//!     Ok(())
//! }
//!
//! async fn drain(mut source: AsyncGenerator<u32>) -> anyhow::Result<Vec<u32>> {
//!     let mut seen = Vec::new();
//!     while let Some(value) = source.next().await? {
//!         seen.push(value);
//!     }
//!     Ok(seen)
//! }
//!
//! let values = Task::new(drain(AsyncGenerator::new(countdown))).wait().unwrap();
//! assert_eq!(values, vec![3, 2, 1]);
//! ```

use crate::error::Result;
use crate::task::Task;
use crate::yielder::{GeneratorCore, GeneratorState, Yielder};

use futures::Stream;
use parking_lot::Mutex;

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A lazily evaluated asynchronous sequence of `T`.
#[must_use = "generators are lazy and do nothing unless advanced"]
pub struct AsyncGenerator<T> {
    core: Arc<Mutex<GeneratorCore<T>>>,
}

impl<T: Send + 'static> AsyncGenerator<T> {
    /// Creates a generator from a body. Nothing runs until the first advance.
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Yielder<T>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            core: Arc::new(Mutex::new(GeneratorCore::new(body))),
        }
    }

    /// Returns a task that resumes the body until it yields a value
    /// (`Some`) or completes (`None`).
    ///
    /// Only one advance may be outstanding at a time; await the returned
    /// task before calling `next` again.
    pub fn next(&mut self) -> Task<Option<T>> {
        let core = self.core.clone();
        Task::new(futures::future::poll_fn(move |cx| {
            core.lock()
                .poll_advance(cx)
                .map(|result| result.map_err(anyhow::Error::from))
        }))
    }

    /// Raw form of an advance, for callers implementing their own futures.
    pub fn poll_advance(&mut self, cx: &mut Context<'_>) -> Poll<Result<Option<T>>> {
        self.core.lock().poll_advance(cx)
    }

    /// Returns a task resolving to a cursor positioned at the first value,
    /// or at the end if the body yields nothing.
    pub fn begin(&mut self) -> Task<AsyncCursor<T>> {
        let core = self.core.clone();
        let first = self.next();
        Task::new(async move {
            let current = first.await?;
            anyhow::Ok(AsyncCursor { core, current })
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GeneratorState {
        self.core.lock().state()
    }
}

impl<'a, T: Send + 'static> IntoFuture for &'a mut AsyncGenerator<T> {
    type Output = Result<Option<T>>;
    type IntoFuture = Task<Option<T>>;

    /// `(&mut source).await` is the same as `source.next().await`.
    fn into_future(self) -> Self::IntoFuture {
        self.next()
    }
}

impl<T: Send + 'static> Stream for AsyncGenerator<T> {
    type Item = Result<T>;

    /// Yields each value, then the body's failure once, then ends.
    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.core.lock().poll_next_item(cx)
    }
}

/// Single-pass cursor over an [`AsyncGenerator`].
pub struct AsyncCursor<T> {
    core: Arc<Mutex<GeneratorCore<T>>>,
    current: Option<T>,
}

impl<T: Send + 'static> AsyncCursor<T> {
    /// The value the cursor is positioned at, or `None` at the end.
    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Takes the current value out of the cursor.
    pub fn take(&mut self) -> Option<T> {
        self.current.take()
    }

    /// Returns `true` once the sequence is exhausted.
    pub fn is_end(&self) -> bool {
        self.current.is_none() && self.core.lock().state().is_terminal()
    }

    /// Performs another advance of the underlying generator.
    pub async fn advance(&mut self) -> Result<()> {
        let core = self.core.clone();
        self.current = futures::future::poll_fn(move |cx| core.lock().poll_advance(cx)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::generator::Generator;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn three(co: Yielder<i32>) -> anyhow::Result<()> {
        co.yield_value(1).await;
        co.yield_value(2).await;
        co.yield_value(3).await;
        Ok(())
    }

    async fn fails_after_one(co: Yielder<i32>) -> anyhow::Result<()> {
        co.yield_value(1).await;
        anyhow::bail!("fake exception")
    }

    #[test]
    fn test_body_is_lazy() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut source: AsyncGenerator<i32> = AsyncGenerator::new(move |co| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            co.yield_value(1).await;
            anyhow::Ok(())
        });

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(source.state(), GeneratorState::NotStarted);
        assert_eq!(source.next().wait().unwrap(), Some(1));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(source.state(), GeneratorState::Yielded);
    }

    #[test]
    fn test_advance_sequence() {
        let mut source = AsyncGenerator::new(three);
        assert_eq!(source.next().wait().unwrap(), Some(1));
        assert_eq!(source.next().wait().unwrap(), Some(2));
        assert_eq!(source.next().wait().unwrap(), Some(3));
        assert_eq!(source.next().wait().unwrap(), None);
        assert_eq!(source.state(), GeneratorState::Exhausted);
        assert_eq!(source.next().wait().unwrap(), None);
    }

    #[test]
    fn test_failure_reported_once() {
        let mut source = AsyncGenerator::new(fails_after_one);
        assert_eq!(source.next().wait().unwrap(), Some(1));
        assert_eq!(source.next().wait().unwrap_err().to_string(), "fake exception");
        assert_eq!(source.state(), GeneratorState::Failed);
        assert!(matches!(source.next().wait(), Err(Error::AlreadyFailed)));
    }

    #[test]
    fn test_into_future_advances() {
        async fn sum(mut source: AsyncGenerator<i32>) -> anyhow::Result<i32> {
            let mut total = 0;
            while let Some(value) = (&mut source).await? {
                total += value;
            }
            Ok(total)
        }
        let total = Task::new(sum(AsyncGenerator::new(three))).wait().unwrap();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_cursor() {
        async fn walk(mut source: AsyncGenerator<i32>) -> anyhow::Result<Vec<i32>> {
            let mut seen = Vec::new();
            let mut cursor = source.begin().await?;
            while !cursor.is_end() {
                if let Some(value) = cursor.get() {
                    seen.push(*value);
                }
                cursor.advance().await?;
            }
            Ok(seen)
        }
        let seen = Task::new(walk(AsyncGenerator::new(three))).wait().unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_stream_ends_after_failure() {
        use futures::StreamExt;

        async fn drain(source: AsyncGenerator<i32>) -> anyhow::Result<Vec<Result<i32>>> {
            Ok(StreamExt::collect::<Vec<_>>(source).await)
        }
        let items = Task::new(drain(AsyncGenerator::new(fails_after_one)))
            .wait()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(*items[0].as_ref().unwrap(), 1);
        assert!(items[1].is_err());
    }

    #[test]
    fn test_drop_releases_suspended_body() {
        struct Guard(Arc<AtomicUsize>);
        impl Drop for Guard {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let guard = Guard(drops.clone());
        let mut source: AsyncGenerator<i32> = AsyncGenerator::new(move |co| async move {
            let _guard = guard;
            co.yield_value(1).await;
            co.yield_value(2).await;
            anyhow::Ok(())
        });

        assert_eq!(source.next().wait().unwrap(), Some(1));
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(source);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    /// Yields once, then forwards a spent inner generator's error with `?`.
    async fn forwards_spent_failure(co: Yielder<i32>) -> anyhow::Result<()> {
        let inner: Generator<i32> =
            Generator::new(|_co| async { Err::<(), _>(anyhow::anyhow!("inner failure")) });
        co.yield_value(1).await;
        let _ = inner.advance();
        inner.advance()?;
        Ok(())
    }

    #[test]
    fn test_stream_reports_forwarded_already_failed() {
        use futures::StreamExt;

        async fn drain(source: AsyncGenerator<i32>) -> anyhow::Result<Vec<Result<i32>>> {
            Ok(StreamExt::collect::<Vec<_>>(source).await)
        }
        let items = Task::new(drain(AsyncGenerator::new(forwards_spent_failure)))
            .wait()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(*items[0].as_ref().unwrap(), 1);
        assert!(matches!(items[1], Err(Error::AlreadyFailed)));
    }
}
