//! # Capture Source
//!
//! Bridges a push-style audio device callback into a pull-style generator.
//!
//! ## Overview
//!
//! [`capture_channel`] returns two halves sharing one hand-off slot:
//!
//! - [`CaptureFeed`] is given to the device driver. Its methods are called
//!   from the driver's callback thread.
//! - [`CaptureSource`] turns into a generator of captured buffers.
//!
//! When the generator is waiting for data, [`CaptureFeed::push`] resumes it
//! directly on the callback thread, so everything downstream of the capture
//! stage runs there until it suspends again. The slot holds one buffer: data
//! arriving while the pipeline is still busy replaces whatever was pending.
//!
//! ## Usage
//!
//! ```rust
//! use core_pipeline::capture::capture_channel;
//!
//! let (feed, source) = capture_channel();
//! let mut frames = source.frames();
//!
//! std::thread::spawn(move || {
//!     feed.push(&[1, 2, 3]);
//!     feed.close();
//! });
//!
//! // Either the buffer or the end of stream, depending on who wins.
//! let _ = frames.next().wait().unwrap();
//! ```

use crate::error::PipelineError;

use core_coro::AsyncGenerator;
use futures::future::poll_fn;
use parking_lot::Mutex;

use std::sync::Arc;
use std::task::{Poll, Waker};

#[derive(Default)]
struct CaptureState {
    pending: Option<Vec<i16>>,
    waiting: Option<Waker>,
    closed: bool,
    failure: Option<String>,
    replaced: u64,
}

enum Delivery {
    Buffer(Vec<i16>),
    Closed,
    Failed(String),
}

/// Creates a connected feed/source pair.
pub fn capture_channel() -> (CaptureFeed, CaptureSource) {
    let shared = Arc::new(Mutex::new(CaptureState::default()));
    (
        CaptureFeed {
            shared: shared.clone(),
        },
        CaptureSource { shared },
    )
}

/// Device-side half of a capture channel.
///
/// Dropping the feed closes the stream.
pub struct CaptureFeed {
    shared: Arc<Mutex<CaptureState>>,
}

impl CaptureFeed {
    /// Hands a freshly captured buffer to the pipeline.
    ///
    /// If the pipeline is waiting it is resumed on the calling thread before
    /// this returns.
    pub fn push(&self, samples: &[i16]) {
        let waiter = {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            if state.pending.replace(samples.to_vec()).is_some() {
                state.replaced += 1;
                tracing::warn!(
                    replaced = state.replaced,
                    "Capture buffer replaced before the pipeline consumed it"
                );
            }
            state.waiting.take()
        };
        if let Some(waker) = waiter {
            waker.wake();
        }
    }

    /// Ends the stream once any pending buffer has been consumed.
    pub fn close(&self) {
        self.finish(None);
    }

    /// Ends the stream with a device failure.
    pub fn fail(&self, reason: impl Into<String>) {
        self.finish(Some(reason.into()));
    }

    /// Returns `true` while the pipeline is suspended waiting for the next
    /// buffer, i.e. a `push` now resumes it on the calling thread.
    pub fn is_consumer_waiting(&self) -> bool {
        self.shared.lock().waiting.is_some()
    }

    /// Number of buffers overwritten before the pipeline consumed them.
    pub fn replaced_buffers(&self) -> u64 {
        self.shared.lock().replaced
    }

    fn finish(&self, failure: Option<String>) {
        let waiter = {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.failure = failure;
            state.waiting.take()
        };
        if let Some(waker) = waiter {
            waker.wake();
        }
    }
}

impl Drop for CaptureFeed {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pipeline-side half of a capture channel.
pub struct CaptureSource {
    shared: Arc<Mutex<CaptureState>>,
}

impl CaptureSource {
    /// Generator of captured buffers, in arrival order.
    ///
    /// Ends when the feed is closed or dropped; fails with
    /// [`PipelineError::CaptureFailed`] when the feed reports a failure.
    pub fn frames(self) -> AsyncGenerator<Vec<i16>> {
        AsyncGenerator::new(move |co| async move {
            loop {
                match self.delivery().await {
                    Delivery::Buffer(buffer) => co.yield_value(buffer).await,
                    Delivery::Closed => break,
                    Delivery::Failed(reason) => {
                        return Err(anyhow::Error::new(PipelineError::CaptureFailed(reason)));
                    }
                }
            }
            tracing::debug!("Capture stream closed");
            anyhow::Ok(())
        })
    }

    async fn delivery(&self) -> Delivery {
        poll_fn(|cx| {
            let mut state = self.shared.lock();
            if let Some(buffer) = state.pending.take() {
                return Poll::Ready(Delivery::Buffer(buffer));
            }
            if state.closed {
                return Poll::Ready(match state.failure.take() {
                    Some(reason) => Delivery::Failed(reason),
                    None => Delivery::Closed,
                });
            }
            state.waiting = Some(cx.waker().clone());
            Poll::Pending
        })
        .await
    }
}
