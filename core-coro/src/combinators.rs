//! Stage composition and terminal drivers for async generators.
//!
//! Stages are ordinary functions taking a source generator and returning a
//! new one, so `source | stage` and `source.pipe(stage)` are exactly
//! `stage(source)`. Every stage is lazy: it advances its source only when
//! its own consumer advances it.

use crate::async_generator::AsyncGenerator;
use crate::error::Result;
use crate::generator::Generator;
use crate::task::Task;
use crate::yielder::GeneratorState;

use std::ops::BitOr;

impl<T: Send + 'static> AsyncGenerator<T> {
    /// Applies `stage` to this generator.
    pub fn pipe<U, F>(self, stage: F) -> U
    where
        F: FnOnce(Self) -> U,
    {
        stage(self)
    }

    /// Lazily transforms each value with `f`.
    pub fn map<U, F>(mut self, mut f: F) -> AsyncGenerator<U>
    where
        F: FnMut(T) -> U + Send + 'static,
        U: Send + 'static,
    {
        AsyncGenerator::new(move |co| async move {
            while let Some(value) = self.next().await? {
                co.yield_value(f(value)).await;
            }
            anyhow::Ok(())
        })
    }

    /// Like [`AsyncGenerator::map`], passing `args` to every call of `f`.
    pub fn map_with<U, A, F>(mut self, mut f: F, args: A) -> AsyncGenerator<U>
    where
        F: FnMut(T, &A) -> U + Send + 'static,
        A: Send + Sync + 'static,
        U: Send + 'static,
    {
        AsyncGenerator::new(move |co| async move {
            while let Some(value) = self.next().await? {
                co.yield_value(f(value, &args)).await;
            }
            anyhow::Ok(())
        })
    }

    /// Relays each value of a synchronous generator, one at a time.
    ///
    /// The synchronous body runs inline on whichever thread advances the
    /// adapter; no extra suspension is introduced between values.
    pub fn from_sync(source: Generator<T>) -> Self {
        AsyncGenerator::new(move |co| async move {
            while let Some(value) = source.advance()? {
                co.yield_value(value).await;
            }
            anyhow::Ok(())
        })
    }

    /// Drains the generator into a vector.
    pub fn collect(mut self) -> Task<Vec<T>> {
        Task::new(async move {
            let mut values = Vec::new();
            while let Some(value) = self.next().await? {
                values.push(value);
            }
            anyhow::Ok(values)
        })
    }

    /// Drains the generator, handing every value to `f`.
    pub fn for_each<F>(mut self, mut f: F) -> Task<()>
    where
        F: FnMut(T) + Send + 'static,
    {
        Task::new(async move {
            while let Some(value) = self.next().await? {
                f(value);
            }
            anyhow::Ok(())
        })
    }

    /// Iterates synchronously, blocking on each advance.
    pub fn into_blocking_iter(self) -> BlockingIter<T> {
        BlockingIter { source: self }
    }
}

impl<T: Send + 'static> From<Generator<T>> for AsyncGenerator<T> {
    fn from(source: Generator<T>) -> Self {
        AsyncGenerator::from_sync(source)
    }
}

impl<T, U, F> BitOr<F> for AsyncGenerator<T>
where
    T: Send + 'static,
    F: FnOnce(AsyncGenerator<T>) -> U,
{
    type Output = U;

    fn bitor(self, stage: F) -> U {
        self.pipe(stage)
    }
}

/// Blocking iterator over an [`AsyncGenerator`].
///
/// Each call to `next` waits for one advance through [`Task::wait`].
pub struct BlockingIter<T> {
    source: AsyncGenerator<T>,
}

impl<T: Send + 'static> Iterator for BlockingIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.source.state() == GeneratorState::Failed {
            return None;
        }
        self.source.next().wait().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::yielder::Yielder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn one_to_five(co: Yielder<i32>) -> anyhow::Result<()> {
        for i in 1..=5 {
            co.yield_value(i).await;
        }
        Ok(())
    }

    fn double(source: AsyncGenerator<i32>) -> AsyncGenerator<i32> {
        source.map(|value| value * 2)
    }

    #[test]
    fn test_pipe_and_bitor_are_application() {
        let piped = AsyncGenerator::new(one_to_five).pipe(double).collect();
        let barred = (AsyncGenerator::new(one_to_five) | double).collect();
        assert_eq!(piped.wait().unwrap(), vec![2, 4, 6, 8, 10]);
        assert_eq!(barred.wait().unwrap(), vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_map_with_args() {
        let scaled = AsyncGenerator::new(one_to_five)
            .map_with(|value, factor: &i32| value * factor, 10)
            .collect();
        assert_eq!(scaled.wait().unwrap(), vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_map_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mapped = AsyncGenerator::new(one_to_five).map(move |value| {
            counter.fetch_add(1, Ordering::SeqCst);
            value
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(mapped.next().wait().unwrap(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_sync_relays_values() {
        let relayed = AsyncGenerator::from(Generator::from_items(vec![1, 2, 3]));
        assert_eq!(relayed.collect().wait().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_from_sync_relays_failure() {
        async fn fails(co: Yielder<i32>) -> anyhow::Result<()> {
            co.yield_value(7).await;
            anyhow::bail!("sync failure")
        }
        let mut relayed = AsyncGenerator::from_sync(Generator::new(fails));
        assert_eq!(relayed.next().wait().unwrap(), Some(7));
        assert_eq!(relayed.next().wait().unwrap_err().to_string(), "sync failure");
    }

    #[test]
    fn test_for_each() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        AsyncGenerator::new(one_to_five)
            .for_each(move |value| sink.lock().push(value))
            .wait()
            .unwrap();
        assert_eq!(*seen.lock(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_blocking_iter() {
        let values: Vec<i32> = AsyncGenerator::new(one_to_five)
            .into_blocking_iter()
            .map(|value| value.unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_blocking_iter_on_empty_source() {
        let empty = AsyncGenerator::from_sync(Generator::<i32>::from_items(Vec::new()));
        assert_eq!(empty.into_blocking_iter().count(), 0);
    }

    #[test]
    fn test_blocking_iter_reports_forwarded_already_failed() {
        let source: AsyncGenerator<i32> = AsyncGenerator::new(|co| async move {
            let inner: Generator<i32> =
                Generator::new(|_co| async { Err::<(), _>(anyhow::anyhow!("inner failure")) });
            co.yield_value(1).await;
            let _ = inner.advance();
            inner.advance()?;
            anyhow::Ok(())
        });

        let items: Vec<Result<i32>> = source.into_blocking_iter().collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Ok(1)));
        assert!(matches!(items[1], Err(Error::AlreadyFailed)));
    }
}
