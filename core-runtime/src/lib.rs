//! # Core Runtime Module
//!
//! Ambient infrastructure shared by the coroutine runtime and the pipeline:
//! - Logging and tracing infrastructure
//! - Pipeline configuration
//! - Scope latency logging
//!
//! ## Overview
//!
//! This crate holds the pieces every other crate in the workspace leans on
//! without depending on each other: how events are formatted and mirrored,
//! how pipeline settings are loaded and validated, and how stage latency is
//! reported.

pub mod config;
pub mod error;
pub mod latency;
pub mod logging;

pub use error::{Error, Result};
