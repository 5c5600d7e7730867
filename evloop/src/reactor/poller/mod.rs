//! Readiness polling and OS clock access.
//!
//! The reactor keeps its own `pollfd` buffer (see [`io`](super::io)) and
//! hands it to `poll(2)` on every step, so there is no persistent kernel
//! registration to keep in sync.
//!
//! The concrete implementation is selected at compile time; only unix
//! targets are supported.

pub(crate) mod common;

pub use common::Interest;

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;
