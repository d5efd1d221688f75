//! Exclusive ownership of one suspended body.
//!
//! A [`Frame`] owns a boxed, pinned body and is the only thing allowed to
//! resume or destroy it. Moving the handle moves ownership; [`Frame::take`]
//! leaves an empty handle behind that owns nothing. The body is destroyed
//! exactly once: right after it completes, or when the owning handle is
//! dropped while the body is still suspended.

use crate::error::{Error, Result};

use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

/// A suspended body that can be sent to another thread for resumption.
pub(crate) type Body<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

enum Slot<T> {
    /// Body created or suspended, not yet complete.
    Suspended(Body<T>),
    /// Body ran to completion (or failed) and has been destroyed.
    Completed,
    /// Handle was moved out of; owns nothing.
    Empty,
}

/// Move-only owner of a suspended body.
pub struct Frame<T> {
    slot: Slot<T>,
}

impl<T> Frame<T> {
    /// Wraps `body` without running any of it.
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            slot: Slot::Suspended(Box::pin(body)),
        }
    }

    /// Returns a handle that owns nothing.
    pub fn empty() -> Self {
        Self { slot: Slot::Empty }
    }

    /// Returns `true` once the body has completed, or if the handle is empty.
    pub fn done(&self) -> bool {
        !matches!(self.slot, Slot::Suspended(_))
    }

    /// Returns `true` if this handle owns nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self.slot, Slot::Empty)
    }

    /// Transfers ownership out of this handle, leaving it empty.
    pub fn take(&mut self) -> Frame<T> {
        std::mem::take(self)
    }

    /// Resumes the body until it suspends again or completes.
    ///
    /// A panic inside the body is captured and reported as
    /// [`Error::Panicked`]; it never unwinds through this call. Once the body
    /// completes it is destroyed immediately. Resuming a completed or empty
    /// frame returns [`Error::ResumedAfterCompletion`].
    pub fn resume(&mut self, cx: &mut Context<'_>) -> Poll<Result<T>> {
        let Slot::Suspended(body) = &mut self.slot else {
            return Poll::Ready(Err(Error::ResumedAfterCompletion));
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(cx)));

        let result = match outcome {
            Ok(Poll::Pending) => return Poll::Pending,
            Ok(Poll::Ready(value)) => Ok(value),
            Err(payload) => Err(Error::from_panic(payload)),
        };

        tracing::trace!(failed = result.is_err(), "Frame completed");
        self.slot = Slot::Completed;
        Poll::Ready(result)
    }

    /// Abandons the body without resuming it again.
    ///
    /// Everything the body holds is released now. Calling this on a
    /// completed or empty frame does nothing.
    pub fn destroy(&mut self) {
        if let Slot::Suspended(_) = self.slot {
            tracing::trace!("Abandoning suspended frame");
            self.release(Slot::Completed);
        }
    }

    /// Replaces the slot with `next` and drops the old one. A body whose
    /// destructor panics must not tear down the owner.
    fn release(&mut self, next: Slot<T>) {
        let slot = std::mem::replace(&mut self.slot, next);
        if catch_unwind(AssertUnwindSafe(move || drop(slot))).is_err() {
            tracing::error!("Suspended frame panicked while being destroyed");
        }
    }
}

impl<T> Default for Frame<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Drop for Frame<T> {
    fn drop(&mut self) {
        if let Slot::Suspended(_) = self.slot {
            self.release(Slot::Empty);
        }
    }
}

impl<T> fmt::Debug for Frame<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.slot {
            Slot::Suspended(_) => "suspended",
            Slot::Completed => "completed",
            Slot::Empty => "empty",
        };
        f.debug_struct("Frame").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct DropCounter(Arc<AtomicUsize>);

    struct PanicOnDrop;

    impl Drop for PanicOnDrop {
        fn drop(&mut self) {
            panic!("guard destructor panicked");
        }
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Pending exactly once, then ready.
    struct SuspendOnce(bool);

    impl Future for SuspendOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                Poll::Pending
            }
        }
    }

    fn resume<T>(frame: &mut Frame<T>) -> Poll<Result<T>> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        frame.resume(&mut cx)
    }

    #[test]
    fn test_body_is_lazy() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut frame = Frame::new(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            7
        });

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!frame.done());
        assert!(matches!(resume(&mut frame), Poll::Ready(Ok(7))));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(frame.done());
    }

    #[test]
    fn test_resume_after_completion_is_violation() {
        let mut frame = Frame::new(async { 1 });
        let _ = resume(&mut frame);
        assert!(matches!(
            resume(&mut frame),
            Poll::Ready(Err(Error::ResumedAfterCompletion))
        ));
    }

    #[test]
    fn test_drop_destroys_suspended_body() {
        let drops = Arc::new(AtomicUsize::new(0));
        let guard = DropCounter(drops.clone());
        let mut frame = Frame::new(async move {
            let _guard = guard;
            SuspendOnce(false).await;
        });

        assert!(resume(&mut frame).is_pending());
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(frame);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_take_leaves_empty_handle() {
        let drops = Arc::new(AtomicUsize::new(0));
        let guard = DropCounter(drops.clone());
        let mut original = Frame::new(async move {
            let _guard = guard;
        });

        let moved = original.take();
        assert!(original.is_empty());
        assert!(original.done());
        drop(original);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(moved);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_is_captured() {
        let mut frame: Frame<()> = Frame::new(async { panic!("fake panic") });
        match resume(&mut frame) {
            Poll::Ready(Err(Error::Panicked(message))) => assert_eq!(message, "fake panic"),
            other => panic!("unexpected poll result: {:?}", other.map(|r| r.is_ok())),
        }
        assert!(frame.done());
    }

    #[test]
    fn test_destroy_releases_resources_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let guard = DropCounter(drops.clone());
        let mut frame = Frame::new(async move {
            let _guard = guard;
            SuspendOnce(false).await;
        });
        assert!(resume(&mut frame).is_pending());

        frame.destroy();
        frame.destroy();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(matches!(
            resume(&mut frame),
            Poll::Ready(Err(Error::ResumedAfterCompletion))
        ));
    }

    #[test]
    fn test_destroy_contains_panicking_destructor() {
        let mut frame = Frame::new(async move {
            let _guard = PanicOnDrop;
            SuspendOnce(false).await;
        });
        assert!(resume(&mut frame).is_pending());

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| frame.destroy()));
        assert!(outcome.is_ok());
        assert!(frame.done());
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_drop_contains_panicking_destructor() {
        let mut frame = Frame::new(async move {
            let _guard = PanicOnDrop;
            SuspendOnce(false).await;
        });
        assert!(resume(&mut frame).is_pending());

        assert!(std::panic::catch_unwind(AssertUnwindSafe(move || drop(frame))).is_ok());
    }
}
