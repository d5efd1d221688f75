//! # Timed Resumption
//!
//! The runtime has no scheduler of its own; bodies run on whichever thread
//! resumes them. This module provides the few places where a body asks to
//! be resumed somewhere else, or later:
//!
//! - [`SerialExecutor`] owns one timer thread. [`SerialExecutor::sleep_until`]
//!   suspends the calling body and resumes it on that thread at or after
//!   the deadline, exactly once.
//! - [`transfer_to_thread`] resumes the calling body on a freshly spawned
//!   thread.
//! - [`yield_now`] reschedules the calling body once.
//!
//! ```rust
//! use core_coro::executor::SerialExecutor;
//! use core_coro::Task;
//! use std::time::{Duration, Instant};
//!
//! let executor = SerialExecutor::new();
//! let timer = executor.handle();
//! let start = Instant::now();
//! Task::new(async move {
//!     timer.sleep(Duration::from_millis(5)).await?;
//!     anyhow::Ok(())
//! })
//! .wait()
//! .unwrap();
//! assert!(start.elapsed() >= Duration::from_millis(5));
//! ```

use crate::error::{Error, Result};

use parking_lot::{Condvar, Mutex, MutexGuard};

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

// ============================================================================
// Timer Queue
// ============================================================================

/// State shared between one outstanding [`Sleep`] and the timer thread.
struct TimerState {
    fired: AtomicBool,
    cancelled: AtomicBool,
    /// The executor stopped before the deadline.
    shut_down: AtomicBool,
    waker: Mutex<Option<Waker>>,
}

impl TimerState {
    fn new(waker: Option<Waker>) -> Self {
        Self {
            fired: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            waker: Mutex::new(waker),
        }
    }

    /// The sleep's result, once there is one.
    fn outcome(&self) -> Option<Result<()>> {
        if self.fired.load(Ordering::Acquire) {
            Some(Ok(()))
        } else if self.shut_down.load(Ordering::Acquire) {
            Some(Err(Error::ExecutorShutDown))
        } else {
            None
        }
    }
}

/// A scheduled wake-up.
///
/// Ordered by deadline, ties broken by registration order, reversed so a
/// `BinaryHeap<TimerEntry>` pops the earliest entry first.
struct TimerEntry {
    deadline: Instant,
    sequence: u64,
    state: Arc<TimerState>,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for TimerEntry {}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct TimerQueue {
    entries: BinaryHeap<TimerEntry>,
    next_sequence: u64,
    shutdown: bool,
}

struct Shared {
    queue: Mutex<TimerQueue>,
    changed: Condvar,
}

impl Shared {
    fn register(&self, deadline: Instant, state: Arc<TimerState>) -> Result<()> {
        let mut queue = self.queue.lock();
        if queue.shutdown {
            return Err(Error::ExecutorShutDown);
        }
        let sequence = queue.next_sequence;
        queue.next_sequence += 1;
        queue.entries.push(TimerEntry {
            deadline,
            sequence,
            state,
        });
        self.changed.notify_one();
        Ok(())
    }

    /// Body of the timer thread.
    fn run(&self) {
        let mut queue = self.queue.lock();
        loop {
            if queue.shutdown {
                let pending: Vec<Waker> = queue
                    .entries
                    .drain()
                    .filter(|entry| !entry.state.cancelled.load(Ordering::Acquire))
                    .filter_map(|entry| {
                        entry.state.shut_down.store(true, Ordering::Release);
                        let waker = entry.state.waker.lock().take();
                        waker
                    })
                    .collect();
                drop(queue);

                if !pending.is_empty() {
                    tracing::debug!(
                        abandoned = pending.len(),
                        "Serial executor stopping with pending timers"
                    );
                }
                // Each woken body observes the shutdown as a failed sleep.
                for waker in pending {
                    waker.wake();
                }
                return;
            }

            let Some(next) = queue.entries.peek() else {
                self.changed.wait(&mut queue);
                continue;
            };

            let deadline = next.deadline;
            if Instant::now() < deadline {
                self.changed.wait_until(&mut queue, deadline);
                continue;
            }

            let Some(entry) = queue.entries.pop() else {
                continue;
            };
            if entry.state.cancelled.load(Ordering::Acquire) {
                continue;
            }
            entry.state.fired.store(true, Ordering::Release);
            let waker = entry.state.waker.lock().take();
            if let Some(waker) = waker {
                // The woken body may run inline here and register new timers.
                MutexGuard::unlocked(&mut queue, || waker.wake());
            }
        }
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Owner of the timer thread.
///
/// Dropping the executor stops the thread. Sleeps that have not fired yet
/// are resumed once more and fail with [`Error::ExecutorShutDown`].
pub struct SerialExecutor {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl SerialExecutor {
    /// Starts the timer thread.
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(TimerQueue::default()),
            changed: Condvar::new(),
        });
        let worker = shared.clone();
        let spawned = thread::Builder::new()
            .name("serial-executor".to_string())
            .spawn(move || worker.run());
        let thread = match spawned {
            Ok(handle) => Some(handle),
            Err(error) => {
                tracing::error!(%error, "Failed to spawn serial executor thread");
                shared.queue.lock().shutdown = true;
                None
            }
        };
        Self { shared, thread }
    }

    /// A cloneable handle for requesting timers from bodies.
    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            shared: self.shared.clone(),
        }
    }

    /// Id of the timer thread, if it is running.
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.thread.as_ref().map(|handle| handle.thread().id())
    }

    /// See [`TimerHandle::sleep_until`].
    pub fn sleep_until(&self, deadline: Instant) -> Sleep {
        self.handle().sleep_until(deadline)
    }

    /// See [`TimerHandle::sleep`].
    pub fn sleep(&self, duration: Duration) -> Sleep {
        self.handle().sleep(duration)
    }
}

impl Default for SerialExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SerialExecutor {
    fn drop(&mut self) {
        self.shared.queue.lock().shutdown = true;
        self.shared.changed.notify_all();

        if let Some(handle) = self.thread.take() {
            // Dropped from a body running on the timer thread itself.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::error!("Serial executor thread panicked");
            }
        }
    }
}

/// Cloneable handle to a [`SerialExecutor`]'s timer queue.
#[derive(Clone)]
pub struct TimerHandle {
    shared: Arc<Shared>,
}

impl TimerHandle {
    /// Suspends the calling body until `deadline`.
    ///
    /// The body is resumed on the executor thread at or after the deadline,
    /// exactly once, even if the deadline has already passed.
    pub fn sleep_until(&self, deadline: Instant) -> Sleep {
        Sleep {
            deadline,
            shared: self.shared.clone(),
            state: None,
        }
    }

    /// Suspends the calling body for `duration`.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        self.sleep_until(Instant::now() + duration)
    }
}

/// Future returned by [`TimerHandle::sleep_until`].
///
/// Dropping a `Sleep` before it fires cancels its timer.
#[must_use = "a sleep does nothing unless awaited"]
pub struct Sleep {
    deadline: Instant,
    shared: Arc<Shared>,
    state: Option<Arc<TimerState>>,
}

impl Sleep {
    /// The instant this sleep resumes at or after.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match &this.state {
            Some(state) => {
                if let Some(outcome) = state.outcome() {
                    return Poll::Ready(outcome);
                }
                *state.waker.lock() = Some(cx.waker().clone());
                // Fired or shut down between the check and the waker update.
                match state.outcome() {
                    Some(outcome) => Poll::Ready(outcome),
                    None => Poll::Pending,
                }
            }
            None => {
                let state = Arc::new(TimerState::new(Some(cx.waker().clone())));
                if let Err(error) = this.shared.register(this.deadline, state.clone()) {
                    return Poll::Ready(Err(error));
                }
                tracing::trace!("Timer registered");
                this.state = Some(state);
                Poll::Pending
            }
        }
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(state) = &self.state {
            if !state.fired.load(Ordering::Acquire) {
                state.cancelled.store(true, Ordering::Release);
                state.waker.lock().take();
                tracing::trace!("Timer cancelled");
            }
        }
    }
}

// ============================================================================
// Thread Handoff
// ============================================================================

/// Future returned by [`transfer_to_thread`].
#[must_use = "a thread transfer does nothing unless awaited"]
pub struct TransferToThread {
    spawned: bool,
}

/// Resumes the calling body on a freshly spawned thread.
pub fn transfer_to_thread() -> TransferToThread {
    TransferToThread { spawned: false }
}

impl Future for TransferToThread {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.spawned {
            return Poll::Ready(Ok(()));
        }
        let waker = cx.waker().clone();
        let spawned = thread::Builder::new()
            .name("coro-transfer".to_string())
            .spawn(move || waker.wake());
        match spawned {
            Ok(_) => {
                self.spawned = true;
                Poll::Pending
            }
            Err(error) => Poll::Ready(Err(Error::Body(error.into()))),
        }
    }
}

/// Future returned by [`yield_now`].
#[must_use = "a yield does nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

/// Suspends the calling body once and asks to be resumed right away.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
