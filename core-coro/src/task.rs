//! # Lazy Tasks
//!
//! A [`Task`] is a one-shot deferred computation producing a single value
//! or a failure.
//!
//! ## Overview
//!
//! - **Lazy**: creating a task runs none of its body.
//! - **Chainable**: a task is a `Future`, so another body simply awaits it.
//!   Under [`Task::wait`] the awaited frame is handed to the driver instead
//!   of being polled inside the awaiting body, and the awaiting body is
//!   resumed by the driver once the result is stored. Await chains of any
//!   depth run without growing the call stack. Under a foreign executor the
//!   frame is polled in place.
//! - **Blockable**: [`Task::wait`] drives a task from synchronous code, even
//!   when the body finishes on a different thread.
//!
//! Any error returned by the body, or any panic it raises, is captured and
//! reported exactly once at the point the result is observed.

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::wait::{self, Resumable};

use parking_lot::Mutex;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A lazily started computation producing one `T`.
///
/// # Examples
///
/// ```rust
/// use core_coro::Task;
///
/// async fn fetch() -> anyhow::Result<u32> {
///     Ok(42)
/// }
///
/// async fn double() -> anyhow::Result<u32> {
///     let value = Task::new(fetch()).await?;
///     Ok(value * 2)
/// }
///
/// assert_eq!(Task::new(double()).wait().unwrap(), 84);
/// ```
#[must_use = "tasks are lazy and do nothing unless awaited or waited on"]
pub struct Task<T> {
    state: TaskState<T>,
}

enum TaskState<T> {
    /// The task owns its frame.
    Owned(Frame<anyhow::Result<T>>),
    /// The frame was handed to the driver; the result lands here.
    HandedOff(Arc<Mutex<Option<Result<T>>>>),
    /// The result has been observed.
    Consumed,
}

/// A task frame resumed directly by the driver.
struct HandedOffFrame<T> {
    frame: Frame<anyhow::Result<T>>,
    result: Arc<Mutex<Option<Result<T>>>>,
}

impl<T: Send + 'static> Resumable for HandedOffFrame<T> {
    fn resume(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match self.frame.resume(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(outcome) => {
                *self.result.lock() = Some(settle(outcome));
                Poll::Ready(())
            }
        }
    }

    fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.result) == 1
    }
}

fn settle<T>(outcome: Result<anyhow::Result<T>>) -> Result<T> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(Error::from_body(error)),
        Err(error) => Err(error),
    }
}

impl<T> Unpin for Task<T> {}

impl<T: Send + 'static> Task<T> {
    /// Wraps `body` without running any of it.
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            state: TaskState::Owned(Frame::new(body)),
        }
    }

    /// A task that resolves to `value` on first resumption.
    pub fn ready(value: T) -> Self {
        Self::new(async move { anyhow::Ok(value) })
    }

    /// A task that fails with `error` on first resumption.
    pub fn failed(error: impl Into<anyhow::Error>) -> Self {
        let error = error.into();
        Self::new(async move { Err::<T, _>(error) })
    }

    /// Blocks the calling thread until the task completes.
    ///
    /// The body starts on the calling thread. If it suspends waiting on
    /// another thread, that thread resumes it and the caller is released
    /// through a one-shot latch once the result is in.
    pub fn wait(self) -> Result<T> {
        wait::block_on(self)
    }

    /// Returns a task whose value is `f` applied to this task's value.
    pub fn map<U, F>(self, f: F) -> Task<U>
    where
        F: FnOnce(T) -> U + Send + 'static,
        U: Send + 'static,
    {
        Task::new(async move {
            let value = self.await?;
            anyhow::Ok(f(value))
        })
    }

    /// Like [`Task::map`], passing `args` to `f` alongside the value.
    pub fn map_with<U, A, F>(self, f: F, args: A) -> Task<U>
    where
        F: FnOnce(T, A) -> U + Send + 'static,
        A: Send + 'static,
        U: Send + 'static,
    {
        Task::new(async move {
            let value = self.await?;
            anyhow::Ok(f(value, args))
        })
    }

    /// Drops the value, keeping only completion and failure.
    pub fn discard(self) -> Task<()> {
        self.map(|_| ())
    }
}

impl<T> Task<T> {
    /// Returns `true` once the body has finished.
    pub fn done(&self) -> bool {
        match &self.state {
            TaskState::Owned(frame) => frame.done(),
            TaskState::HandedOff(result) => result.lock().is_some(),
            TaskState::Consumed => true,
        }
    }
}

impl<T: Send + 'static> Future for Task<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            TaskState::Consumed => Poll::Ready(Err(Error::AlreadyConsumed)),
            TaskState::HandedOff(result) => {
                let Some(outcome) = result.lock().take() else {
                    return Poll::Pending;
                };
                this.state = TaskState::Consumed;
                Poll::Ready(outcome)
            }
            TaskState::Owned(frame) => {
                if !frame.done() {
                    let result = Arc::new(Mutex::new(None));
                    let handed_off = wait::hand_off(cx, || -> Box<dyn Resumable> {
                        Box::new(HandedOffFrame {
                            frame: frame.take(),
                            result: result.clone(),
                        })
                    });
                    if handed_off {
                        this.state = TaskState::HandedOff(result);
                        return Poll::Pending;
                    }
                }

                match frame.resume(cx) {
                    Poll::Pending => Poll::Pending,
                    Poll::Ready(outcome) => {
                        this.state = TaskState::Consumed;
                        Poll::Ready(settle(outcome))
                    }
                }
            }
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Task");
        match &self.state {
            TaskState::Owned(frame) => debug.field("frame", frame),
            TaskState::HandedOff(_) => debug.field("frame", &"handed off"),
            TaskState::Consumed => debug.field("consumed", &true),
        };
        debug.finish()
    }
}
