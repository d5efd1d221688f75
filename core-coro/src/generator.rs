//! Synchronous, single-pass, pull-based producer.
//!
//! Resumption always happens immediately on the calling thread. The body
//! may only suspend at its yield points; if it awaits anything else the
//! generator reports [`Error::SuspendedOutsideYield`] and stays failed.
//!
//! A [`Generator`] can be cloned so several closures can hold it, but all
//! clones share one frame and only one logical consumer may advance it at a
//! time. Concurrent advances from several threads serialise on the control
//! block lock; they do not make the sequence multi-consumer.

use crate::error::{Error, Result};
use crate::yielder::{GeneratorCore, GeneratorState, Yielder};

use futures::task::noop_waker_ref;
use parking_lot::Mutex;

use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A synchronous generator of `T` values.
pub struct Generator<T> {
    core: Arc<Mutex<GeneratorCore<T>>>,
}

impl<T> Clone for Generator<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Send + 'static> Generator<T> {
    /// Creates a generator from a body. Nothing runs until the first advance.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use core_coro::{Generator, Yielder};
    ///
    /// async fn iota(co: Yielder<u32>) -> anyhow::Result<()> {
    ///     for i in 0.. {
    ///         co.yield_value(i).await;
    ///     }
    ///     Ok(())
    /// }
    ///
    /// let numbers = Generator::new(iota);
    /// assert_eq!(numbers.advance().unwrap(), Some(0));
    /// assert_eq!(numbers.advance().unwrap(), Some(1));
    /// ```
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Yielder<T>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            core: Arc::new(Mutex::new(GeneratorCore::new(body))),
        }
    }

    /// Builds a generator that yields every item of `items` in order.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let items = items.into_iter();
        Self::new(move |co| async move {
            for item in items {
                co.yield_value(item).await;
            }
            anyhow::Ok(())
        })
    }

    /// Resumes the body and returns the next value, `None` once exhausted,
    /// or the body's failure.
    pub fn advance(&self) -> Result<Option<T>> {
        let mut core = self.core.lock();
        let mut cx = Context::from_waker(noop_waker_ref());
        match core.poll_advance(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => {
                tracing::warn!("Synchronous generator body suspended outside of a yield");
                core.fail();
                Err(Error::SuspendedOutsideYield)
            }
        }
    }

    /// Returns a cursor already positioned at the first value.
    ///
    /// A later `begin` continues from wherever the sequence currently is;
    /// it does not restart it.
    pub fn begin(&self) -> Result<Cursor<T>> {
        let current = self.advance()?;
        Ok(Cursor {
            generator: self.clone(),
            current,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GeneratorState {
        self.core.lock().state()
    }
}

impl<T: Send + 'static> Iterator for Generator<T> {
    type Item = Result<T>;

    /// Yields each value, then the body's failure once, then `None`.
    fn next(&mut self) -> Option<Self::Item> {
        // The failure itself was already handed out.
        if self.state() == GeneratorState::Failed {
            return None;
        }
        self.advance().transpose()
    }
}

/// Single-pass cursor over a [`Generator`].
///
/// The cursor does not point at an element of a stored sequence; the only
/// meaningful comparison is [`Cursor::is_end`].
pub struct Cursor<T> {
    generator: Generator<T>,
    current: Option<T>,
}

impl<T: Send + 'static> Cursor<T> {
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
        self.current.is_none() && self.generator.state().is_terminal()
    }

    /// Resumes the body and moves to the next value.
    pub fn advance(&mut self) -> Result<()> {
        self.current = self.generator.advance()?;
        Ok(())
    }
}
