//! Cooperative suspension runtime for the spectrogram pipeline.
//!
//! This crate provides lazily evaluated suspended computations that are
//! driven by their consumers rather than by a scheduler:
//!
//! - [`Task`]: a one-shot computation producing one value or a failure.
//! - [`AsyncGenerator`]: a pull-based producer of many values whose body may
//!   await other work between yields.
//! - [`Generator`]: a purely synchronous single-pass producer.
//!
//! # Architecture
//!
//! Every suspended body lives in a [`Frame`], owned by exactly one handle.
//! Consumers resume it by polling; when the body completes its result flows
//! straight back to the consumer, with no scheduler hop in between. The only
//! cross-thread handoff happens when a body itself arranges one (a timer on
//! the [`executor::SerialExecutor`], a device callback, or
//! [`executor::transfer_to_thread`]); [`Task::wait`] bridges such bodies back
//! into synchronous code.
//!
//! # Modules
//!
//! - `frame`: exclusive ownership of one suspended body
//! - `task`: lazy one-shot tasks and their combinators
//! - `async_generator`, `generator`: multi-value producers
//! - `combinators`: `pipe`, `map`, sync-to-async adaptation, terminal drivers
//! - `executor`: timed resumption and explicit thread handoff
//! - `latch`: the one-shot countdown `wait` blocks on
//!
//! # Examples
//!
//! ```rust
//! use core_coro::{AsyncGenerator, Generator, Yielder};
//!
//! async fn squares(co: Yielder<u64>) -> anyhow::Result<()> {
//!     for i in 1..=4 {
//!         co.yield_value(i * i).await;
//!     }
//!     Ok(())
//! }
//!
//! let total = AsyncGenerator::from(Generator::new(squares))
//!     .map(|value| value + 1)
//!     .collect()
//!     .map(|values| values.into_iter().sum::<u64>())
//!     .wait()
//!     .unwrap();
//! assert_eq!(total, 34);
//! ```

// Lets the attribute macros name `::core_coro` from inside this crate too.
extern crate self as core_coro;

// Re-export the entry-point/test macros so downstream crates can drive
// `async fn` bodies without a foreign executor.
pub use core_coro_macros::{main, test};

pub mod async_generator;
pub mod combinators;
pub mod error;
pub mod executor;
pub mod frame;
pub mod generator;
pub mod latch;
pub mod task;
mod wait;
mod yielder;

pub use async_generator::{AsyncCursor, AsyncGenerator};
pub use combinators::BlockingIter;
pub use error::{Error, Result};
pub use frame::Frame;
pub use generator::{Cursor, Generator};
pub use latch::Latch;
pub use task::Task;
pub use yielder::{GeneratorState, YieldValue, Yielder};

#[doc(hidden)]
pub mod __private {
    pub use anyhow;
}
