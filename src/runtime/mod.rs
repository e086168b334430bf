//! Runtime support for reactive primitives.
//!
//! This module provides the infrastructure for dependency tracking
//! and the execution contexts signals and effects run in.

mod context;

pub use context::ReactiveRuntime;
