use crate::clock::{Clock, MonotonicClock};
use crate::error::Result;
use crate::reactor::Reactor;

/// Builder for configuring and creating a reactor.
///
/// `ReactorBuilder` allows customizing the reactor before constructing
/// it: the clock it keeps time with and how much room each registration
/// table reserves up front.
///
/// # Examples
///
/// ```rust
/// use evloop::{Reactor, ReactorBuilder};
/// use evloop::clock::ManualClock;
///
/// let reactor: Reactor<u32> = ReactorBuilder::new()
///     .clock(ManualClock::new())
///     .timer_capacity(64)
///     .build()?;
/// # Ok::<(), evloop::Error>(())
/// ```
pub struct ReactorBuilder {
    /// Clock used for deadlines; `None` means the OS monotonic clock.
    clock: Option<Box<dyn Clock>>,

    /// Initial capacity of the timer heap.
    timer_capacity: usize,

    /// Initial capacity of the event table.
    event_capacity: usize,

    /// Initial capacity of the I/O watch table.
    io_capacity: usize,
}

impl ReactorBuilder {
    /// Creates a new `ReactorBuilder` with default configuration.
    ///
    /// By default the reactor uses [`MonotonicClock`] and reserves
    /// nothing up front.
    pub fn new() -> Self {
        Self {
            clock: None,
            timer_capacity: 0,
            event_capacity: 0,
            io_capacity: 0,
        }
    }

    /// Sets the clock the reactor reads and sleeps on.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Reserves room for `n` timers and pending triggers.
    pub fn timer_capacity(mut self, n: usize) -> Self {
        self.timer_capacity = n;
        self
    }

    /// Reserves room for `n` events.
    pub fn event_capacity(mut self, n: usize) -> Self {
        self.event_capacity = n;
        self
    }

    /// Reserves room for `n` I/O watches.
    pub fn io_capacity(mut self, n: usize) -> Self {
        self.io_capacity = n;
        self
    }

    /// Builds the reactor with the configured options.
    ///
    /// Fails with [`Error::Alloc`](crate::Error::Alloc) if a requested
    /// capacity cannot be reserved.
    pub fn build<E>(self) -> Result<Reactor<E>> {
        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()));

        let mut reactor = Reactor::with_clock(clock);
        reactor.reserve(self.timer_capacity, self.event_capacity, self.io_capacity)?;

        log::debug!(
            "reactor built: timers={} events={} io={}",
            self.timer_capacity,
            self.event_capacity,
            self.io_capacity
        );

        Ok(reactor)
    }
}

impl Default for ReactorBuilder {
    /// Creates a default `ReactorBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
