//! Workspace umbrella crate.
//!
//! Re-exports the workspace crates behind feature flags so host
//! applications can depend on `spectro-workspace` alone:
//!
//! - `coro` is always available
//! - `runtime` enables `core-runtime` (logging, config, latency)
//! - `pipeline` (default) enables `core-pipeline` and implies `runtime`

pub use core_coro as coro;

#[cfg(feature = "runtime")]
pub use core_runtime as runtime;

#[cfg(feature = "pipeline")]
pub use core_pipeline as pipeline;
