//! # Runtime Error Types
//!
//! Failures observed when resuming, awaiting or advancing a suspended body.
//!
//! Two families live here:
//! - **body failures**: an error returned (or a panic raised) by the body
//!   while its frame was running. These are captured into the control block
//!   and rethrown exactly once, wherever the result is observed.
//! - **contract violations**: programmer errors such as observing a task
//!   result twice. They get their own variants so they never masquerade as
//!   a silent success.

use thiserror::Error;

/// Errors surfaced by tasks and generators.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Body Failures
    // ========================================================================
    /// The body returned an error.
    #[error(transparent)]
    Body(anyhow::Error),

    /// The body panicked while its frame was being resumed.
    #[error("Body panicked: {0}")]
    Panicked(String),

    // ========================================================================
    // Contract Violations
    // ========================================================================
    /// The result of a task was already taken by an earlier observation.
    #[error("Task result already consumed")]
    AlreadyConsumed,

    /// A generator whose failure was already observed was advanced again.
    #[error("Generator already failed")]
    AlreadyFailed,

    /// A synchronous generator body suspended somewhere other than a yield.
    #[error("Synchronous generator suspended outside of a yield point")]
    SuspendedOutsideYield,

    /// A frame was resumed after its body had already completed.
    #[error("Frame resumed after completion")]
    ResumedAfterCompletion,

    // ========================================================================
    // Executor Errors
    // ========================================================================
    /// A timer was requested from an executor whose thread has stopped.
    #[error("Serial executor has shut down")]
    ExecutorShutDown,
}

impl Error {
    /// Captures an error returned by a body.
    ///
    /// Errors that are themselves runtime errors (e.g. a nested task failure
    /// forwarded with `?`) are unwrapped so chains do not nest.
    pub fn from_body(error: anyhow::Error) -> Self {
        match error.downcast::<Error>() {
            Ok(inner) => inner,
            Err(error) => Error::Body(error),
        }
    }

    /// Builds a [`Error::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Error::Panicked(message)
    }

    /// Returns `true` if this error was raised by a body rather than by
    /// misuse of the runtime.
    pub fn is_body_failure(&self) -> bool {
        matches!(self, Error::Body(_) | Error::Panicked(_))
    }

    /// Returns `true` if this error reports a contract violation.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::AlreadyConsumed
                | Error::AlreadyFailed
                | Error::SuspendedOutsideYield
                | Error::ResumedAfterCompletion
        )
    }

    /// Attempts to downcast a body failure to a concrete error type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Error::Body(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
