//! Yield points and the control block shared by both generator kinds.
//!
//! A generator body receives a [`Yielder`] and hands values to its consumer
//! with `co.yield_value(v).await`. The yield stores the value in the
//! control block's slot and suspends the body; the consumer's advance takes
//! the value out and returns it. The next advance resumes the body past the
//! yield point.

use crate::error::{Error, Result};
use crate::frame::Frame;

use parking_lot::Mutex;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Lifecycle of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Body has not run yet.
    NotStarted,
    /// Body is suspended at a yield point; its value was handed out.
    Yielded,
    /// Body is suspended on something other than a yield (a timer, a device
    /// callback, another task) and will wake the consumer when ready.
    Awaiting,
    /// Body completed; no further values.
    Exhausted,
    /// Body failed; the failure has been (or is being) reported.
    Failed,
}

impl GeneratorState {
    /// Returns `true` for `Exhausted` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, GeneratorState::Exhausted | GeneratorState::Failed)
    }
}

/// Handle a generator body uses to yield values to its consumer.
pub struct Yielder<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Yielder<T> {
    /// Hands `value` to the consumer and suspends until the next advance.
    pub fn yield_value(&self, value: T) -> YieldValue<'_, T> {
        YieldValue {
            yielder: self,
            value: Some(value),
        }
    }
}

/// Future returned by [`Yielder::yield_value`].
///
/// Pending exactly once (the suspension), then ready on the next resume.
#[must_use = "a yield does nothing unless awaited"]
pub struct YieldValue<'a, T> {
    yielder: &'a Yielder<T>,
    value: Option<T>,
}

impl<T> Unpin for YieldValue<'_, T> {}

impl<T> Future for YieldValue<'_, T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        match this.value.take() {
            Some(value) => {
                // The consumer re-resumes the body itself; no wake needed.
                *this.yielder.slot.lock() = Some(value);
                Poll::Pending
            }
            None => Poll::Ready(()),
        }
    }
}

/// Control block of one generator: its frame, the value slot and its state.
pub(crate) struct GeneratorCore<T> {
    frame: Frame<anyhow::Result<()>>,
    slot: Arc<Mutex<Option<T>>>,
    state: GeneratorState,
}

impl<T> GeneratorCore<T> {
    pub(crate) fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Yielder<T>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let slot = Arc::new(Mutex::new(None));
        let yielder = Yielder { slot: slot.clone() };
        Self {
            frame: Frame::new(body(yielder)),
            slot,
            state: GeneratorState::NotStarted,
        }
    }

    pub(crate) fn state(&self) -> GeneratorState {
        self.state
    }

    /// Resumes the body until it yields, completes or suspends elsewhere.
    pub(crate) fn poll_advance(&mut self, cx: &mut Context<'_>) -> Poll<Result<Option<T>>> {
        match self.state {
            GeneratorState::Exhausted => return Poll::Ready(Ok(None)),
            GeneratorState::Failed => return Poll::Ready(Err(Error::AlreadyFailed)),
            _ => {}
        }

        let resumed = self.frame.resume(cx);
        let (state, outcome) = match resumed {
            Poll::Pending => match self.slot.lock().take() {
                Some(value) => (GeneratorState::Yielded, Poll::Ready(Ok(Some(value)))),
                None => (GeneratorState::Awaiting, Poll::Pending),
            },
            Poll::Ready(Ok(Ok(()))) => (GeneratorState::Exhausted, Poll::Ready(Ok(None))),
            Poll::Ready(Ok(Err(error))) => {
                (GeneratorState::Failed, Poll::Ready(Err(Error::from_body(error))))
            }
            Poll::Ready(Err(error)) => (GeneratorState::Failed, Poll::Ready(Err(error))),
        };

        if state != self.state {
            tracing::trace!(from = ?self.state, to = ?state, "Generator state change");
            self.state = state;
        }
        outcome
    }

    /// [`poll_advance`](Self::poll_advance) shaped as a sequence: each value,
    /// then the body's failure once, then the end.
    pub(crate) fn poll_next_item(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<T>>> {
        // Reaching `Failed` is what handed the failure out.
        if self.state == GeneratorState::Failed {
            return Poll::Ready(None);
        }
        self.poll_advance(cx).map(Result::transpose)
    }

    /// Marks the generator failed without resuming it.
    pub(crate) fn fail(&mut self) {
        self.frame.destroy();
        self.state = GeneratorState::Failed;
    }
}
