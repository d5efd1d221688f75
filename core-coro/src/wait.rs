//! Blocking bridge from a synchronous caller into a suspended body.
//!
//! [`block_on`] wraps the target future in a small driver computation and
//! resumes it directly on the calling thread. If the body suspends because
//! something on another thread will wake it (a device callback, the timer
//! thread, an explicit thread transfer), the waking thread resumes the
//! driver inline. The caller learns about completion through a [`Latch`],
//! never by polling.
//!
//! ## Trampoline
//!
//! The driver owns a stack of frames. While it resumes the top frame, a
//! [`Task`](crate::Task) awaited with the driver's own waker does not poll
//! its body in place: it hands the body over with [`hand_off`] and reports
//! `Pending`. The driver pushes the handed-off frame and resumes it from
//! its loop; when that frame completes it is popped and the frame beneath
//! it, the awaiting one, is resumed and picks up the stored result. Await
//! chains of any depth therefore run at a constant call-stack depth.

use crate::error::{Error, Result};
use crate::latch::Latch;

use futures::task::{waker_ref, ArcWake};
use parking_lot::Mutex;

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// Driver is suspended and not being resumed by anyone.
const IDLE: usize = 0;

/// Some thread is currently resuming the driver.
///
/// At most one thread observes this state at a time.
const RUNNING: usize = 1;

/// The driver was woken while running and must be resumed again by the
/// thread that is currently running it.
const NOTIFIED: usize = 2;

/// The target produced its output; further wake-ups are ignored.
const COMPLETED: usize = 3;

// ============================================================================
// Hand-off
// ============================================================================

/// A frame the driver can resume from its loop.
///
/// `Ready` means the frame finished and has stored its own result.
pub(crate) trait Resumable: Send {
    fn resume(&mut self, cx: &mut Context<'_>) -> Poll<()>;

    /// Returns `true` once nothing is left to observe the result.
    fn is_abandoned(&self) -> bool {
        false
    }
}

/// The hand-off point of the driver currently resuming a frame on this
/// thread.
///
/// `waker` identifies the driver's own context by address; it is compared,
/// never dereferenced.
struct HandOff {
    waker: *const Waker,
    child: Option<Box<dyn Resumable>>,
}

thread_local! {
    static HAND_OFF: RefCell<Option<HandOff>> = const { RefCell::new(None) };
}

/// Gives the frame built by `child` to the driver resuming on this thread,
/// if `cx` is exactly the context that driver passed down and nothing has
/// been handed to it yet during this resume. The child is resumed as soon
/// as the current frame reports `Pending`.
///
/// Returns `false`, without calling `child`, anywhere else.
pub(crate) fn hand_off(cx: &Context<'_>, child: impl FnOnce() -> Box<dyn Resumable>) -> bool {
    HAND_OFF.with(|slot| match slot.borrow_mut().as_mut() {
        Some(point) if point.child.is_none() && std::ptr::eq(cx.waker(), point.waker) => {
            point.child = Some(child());
            true
        }
        _ => false,
    })
}

/// Restores the enclosing driver's hand-off point, so nested `wait` calls
/// on the same thread stay independent.
struct Restore(Option<HandOff>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        HAND_OFF.with(|slot| {
            slot.replace(previous);
        });
    }
}

/// Resumes `frame` with a fresh hand-off point and returns whatever was
/// handed to it.
fn resume_with_hand_off(
    frame: &mut (dyn Resumable + 'static),
    cx: &mut Context<'_>,
) -> (Poll<()>, Option<Box<dyn Resumable>>) {
    let point = HandOff {
        waker: cx.waker() as *const Waker,
        child: None,
    };
    let restore = Restore(HAND_OFF.with(|slot| slot.replace(Some(point))));
    let poll = frame.resume(cx);
    let child = HAND_OFF.with(|slot| slot.borrow_mut().as_mut().and_then(|point| point.child.take()));
    drop(restore);
    (poll, child)
}

// ============================================================================
// Driver
// ============================================================================

/// The root of a driver's stack: the future passed to [`block_on`].
struct Root<F: Future> {
    future: Pin<Box<F>>,
    output: Arc<Mutex<Option<F::Output>>>,
}

impl<F> Resumable for Root<F>
where
    F: Future + Send,
    F::Output: Send,
{
    fn resume(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match self.future.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(output) => {
                *self.output.lock() = Some(output);
                Poll::Ready(())
            }
        }
    }
}

struct Driver {
    state: AtomicUsize,
    frames: Mutex<Vec<Box<dyn Resumable>>>,
    complete: Latch,
}

impl Driver {
    fn new(root: Box<dyn Resumable>) -> Self {
        Self {
            state: AtomicUsize::new(IDLE),
            frames: Mutex::new(vec![root]),
            complete: Latch::new(1),
        }
    }

    /// Resumes the driver on the current thread, unless another thread is
    /// already doing so, in which case that thread is told to go again.
    fn schedule(self: &Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.run();
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already notified or finished: nothing to do.
                _ => return,
            }
        }
    }

    fn run(self: &Arc<Self>) {
        let waker = waker_ref(self);
        let mut cx = Context::from_waker(&waker);
        let mut frames = self.frames.lock();

        loop {
            let Some(top) = frames.last_mut() else {
                return;
            };
            if top.is_abandoned() {
                tracing::trace!("Dropping handed-off frame nobody awaits");
                drop(frames.pop());
                continue;
            }

            match resume_with_hand_off(top.as_mut(), &mut cx) {
                (Poll::Pending, Some(child)) => {
                    frames.push(child);
                }
                (Poll::Ready(()), abandoned) => {
                    drop(abandoned);
                    drop(frames.pop());
                    if frames.is_empty() {
                        drop(frames);
                        self.state.store(COMPLETED, Ordering::Release);
                        self.complete.count_down();
                        return;
                    }
                }
                (Poll::Pending, None) => {
                    if self
                        .state
                        .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                    // Woken while running; go around again on this thread.
                    self.state.store(RUNNING, Ordering::Release);
                }
            }
        }
    }
}

impl ArcWake for Driver {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.schedule();
    }
}

/// Drives `future` to completion, blocking the calling thread.
///
/// The calling thread does the first resumption itself. Later resumptions
/// happen on whichever thread wakes the body.
pub(crate) fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let output = Arc::new(Mutex::new(None));
    let root = Root {
        future: Box::pin(future),
        output: output.clone(),
    };
    let driver = Arc::new(Driver::new(Box::new(root)));
    driver.schedule();

    if !driver.complete.try_wait() {
        tracing::trace!("Body suspended off-thread; waiting for completion signal");
        driver.complete.wait();
    }

    let result = output.lock().take();
    result.unwrap_or(Err(Error::AlreadyConsumed))
}
