//! Error types returned by the reactor.
//!
//! Unknown identifiers are not errors: removing or triggering something
//! that is already gone is handled as a no-op.

use crate::reactor::Interest;

use std::collections::TryReserveError;
use std::io;
use std::os::fd::RawFd;

/// Errors produced by mutating reactor operations and by [`step`].
///
/// [`step`]: crate::Reactor::step
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backing table could not grow.
    ///
    /// The operation that failed left the reactor unchanged.
    #[error("allocation failed: {0}")]
    Alloc(#[from] TryReserveError),

    /// An I/O watch was registered with an interest other than readable.
    #[error("unsupported I/O interest {0:?}, only readable is supported")]
    UnsupportedInterest(Interest),

    /// A 32-bit identifier namespace has been used up.
    #[error("{0} identifiers exhausted")]
    IdsExhausted(&'static str),

    /// The readiness poll itself failed.
    #[error("readiness poll failed: {0}")]
    Poll(#[from] io::Error),

    /// The OS reported a watched descriptor as invalid.
    #[error("watched descriptor {0} is not open")]
    InvalidDescriptor(RawFd),
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
