//! # evloop
//!
//! **evloop** is a single-threaded reactor. A host program registers
//! future work and then drives all of it through one blocking call,
//! [`Reactor::step`], which performs at most one unit of work per call.
//!
//! Four kinds of work can be registered:
//!
//! - **One-shot timers** that fire once after a delay
//! - **Periodic timers** that re-arm at a fixed rate
//! - **Events**: persistent callbacks that run once per trigger, on a later step
//! - **I/O watches**: callbacks run when a file descriptor becomes readable
//!
//! Timers and event triggers share one deadline-ordered heap, so they are
//! dispatched in non-decreasing deadline order. I/O readiness is polled
//! with a timeout bounded by the earliest deadline, so a quiet descriptor
//! never delays a due timer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use evloop::Reactor;
//! use std::time::Duration;
//!
//! let mut reactor: Reactor = Reactor::new();
//!
//! reactor.add_timer(Duration::from_secs(2), |_| println!("two seconds"))?;
//! reactor.add_periodic_timer(
//!     Duration::from_secs(1),
//!     Some(Duration::from_secs(1)),
//!     |reactor| println!("tick at {}us", reactor.now_us()),
//! )?;
//!
//! loop {
//!     reactor.step()?;
//! }
//! # Ok::<(), evloop::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`clock`]: The clock abstraction, the OS clock and a manual clock
//! - [`heap`]: The deadline-ordered timer heap

mod builder;
mod error;
mod reactor;

pub mod clock;

/// The deadline-ordered binary heap used by the reactor.
pub mod heap {
    pub use crate::reactor::heap::{TimerEntry, TimerHeap};
}

pub use builder::ReactorBuilder;
pub use error::{Error, Result};
pub use reactor::{
    EventCallback, EventId, Interest, IoCallback, IoWatchId, Reactor, TimerCallback, TimerId,
};
