//! Reactor core and dispatch.
//!
//! This module implements the scheduling core:
//! - a deadline-ordered timer heap shared by timers and event triggers,
//! - registration tables for events and I/O watches,
//! - the [`Reactor`] that merges both into one blocking `step()`.
//!
//! Callers only interact with [`Reactor`] and the id types; the heap is
//! exposed separately through [`crate::heap`] for direct use.

mod core;
mod event;
mod id;
mod io;
mod timer;

pub(crate) mod heap;
pub(crate) mod poller;

pub use self::core::Reactor;
pub use event::EventCallback;
pub use id::{EventId, IoWatchId, TimerId};
pub use io::IoCallback;
pub use poller::Interest;
pub use timer::TimerCallback;
