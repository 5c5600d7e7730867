use super::event::{Dispatch, EventCallback, EventTable};
use super::heap::{TimerEntry, TimerHeap};
use super::id::{EventId, IdGenerator, IoWatchId, TimerId};
use super::io::{IoCallback, IoTable, Ready};
use super::poller::Interest;
use super::poller::common::is_clamped;
use super::timer::{InFlight, TRIGGER_ID, TimerCallback, TimerPayload};

use crate::clock::{Clock, MonotonicClock};
use crate::error::{Error, Result};

use log::{debug, trace, warn};
use std::io;
use std::mem;
use std::os::fd::RawFd;
use std::time::Duration;

/// The reactor.
///
/// The reactor owns every piece of scheduled work and is responsible for:
/// - ordering timers and triggered events by deadline,
/// - polling watched descriptors for readability,
/// - running exactly one unit of work per [`step`](Self::step).
///
/// It is single-threaded: callbacks run synchronously inside `step()` and
/// receive `&mut Reactor`, so they can add, remove and trigger work. The
/// dispatched entry is always detached from its table before its callback
/// runs, so such mutations never observe a half-dispatched state.
///
/// `E` is the type of the data carried by [`trigger_event`](Self::trigger_event).
///
/// # Examples
///
/// ```rust
/// use evloop::{Reactor, ReactorBuilder};
/// use evloop::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let mut reactor: Reactor = ReactorBuilder::new().clock(clock.clone()).build()?;
///
/// reactor.add_timer(Duration::from_millis(3), |_| println!("fired"))?;
///
/// assert!(reactor.step()?);
/// assert_eq!(clock.now_us(), 3000);
/// assert!(!reactor.step()?);
/// # Ok::<(), evloop::Error>(())
/// ```
pub struct Reactor<E = ()> {
    /// Source of "now" and of the final sleep before a timer fires.
    clock: Box<dyn Clock>,

    /// Timers and pending event triggers, ordered by deadline.
    timers: TimerHeap<TimerPayload<E>>,

    /// Registered events.
    events: EventTable<E>,

    /// Registered I/O watches and their `pollfd` buffer.
    io: IoTable<E>,

    timer_ids: IdGenerator,
    event_ids: IdGenerator,
    io_ids: IdGenerator,

    /// The timer whose callback is running, if any.
    in_flight: Option<InFlight>,
}

impl<E> Reactor<E> {
    /// Creates an empty reactor driven by the OS monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(MonotonicClock::new()))
    }

    pub(crate) fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            timers: TimerHeap::new(),
            events: EventTable::with_capacity(0),
            io: IoTable::with_capacity(0),
            timer_ids: IdGenerator::new("timer"),
            event_ids: IdGenerator::new("event"),
            io_ids: IdGenerator::new("I/O watch"),
            in_flight: None,
        }
    }

    /// Pre-allocates room in each table.
    pub(crate) fn reserve(&mut self, timers: usize, events: usize, io: usize) -> Result<()> {
        self.timers.try_reserve(timers)?;
        self.events.try_reserve(events)?;
        self.io.try_reserve(io)?;
        Ok(())
    }

    /// Current time of the reactor's clock, in microseconds.
    pub fn now_us(&self) -> u64 {
        self.clock.now_us()
    }

    // ── Timers ──────────────────────────────────────────────────────

    /// Schedules `callback` to run once, `delay` from now.
    pub fn add_timer<F>(&mut self, delay: Duration, callback: F) -> Result<TimerId>
    where
        F: FnMut(&mut Reactor<E>) + 'static,
    {
        self.add_periodic_timer(delay, None, callback)
    }

    /// Schedules `callback` to run `delay` from now and then, if `period`
    /// is set, every `period` after that.
    ///
    /// Re-arming is fixed-rate: each new deadline is the previous deadline
    /// plus `period`, independent of how late the callback ran. A deadline
    /// that has already passed fires on the next step without sleeping.
    pub fn add_periodic_timer<F>(
        &mut self,
        delay: Duration,
        period: Option<Duration>,
        callback: F,
    ) -> Result<TimerId>
    where
        F: FnMut(&mut Reactor<E>) + 'static,
    {
        self.timers.try_reserve(1)?;
        let id = TimerId(self.timer_ids.next()?);

        let deadline = self.clock.now_us().saturating_add(as_micros(delay));
        let period = period.map(as_micros);
        let callback: TimerCallback<E> = Box::new(callback);

        self.timers.insert(TimerEntry::new(
            id,
            deadline,
            period,
            TimerPayload::Timer(callback),
        ));

        debug!("added {id}: deadline={deadline}us period={period:?}");
        Ok(id)
    }

    /// Cancels a timer. Unknown and already-fired ids are ignored.
    ///
    /// Returns `true` if the timer would otherwise have fired again.
    pub fn remove_timer(&mut self, id: TimerId) -> bool {
        if id == TRIGGER_ID {
            return false;
        }

        if let Some(in_flight) = self.in_flight.as_mut() {
            if in_flight.id == id && in_flight.rearm {
                in_flight.rearm = false;
                debug!("removed {id} from inside its callback");
                return true;
            }
        }

        let removed = self.timers.remove_by_id(id);
        if removed {
            debug!("removed {id}");
        }

        removed
    }

    /// Returns `true` if the timer is still scheduled.
    pub fn has_timer(&self, id: TimerId) -> bool {
        if id == TRIGGER_ID {
            return false;
        }

        let rearming = self
            .in_flight
            .is_some_and(|in_flight| in_flight.id == id && in_flight.rearm);

        rearming || self.timers.contains(id)
    }

    /// Number of heap entries: scheduled timers plus undispatched event
    /// triggers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Registers an event. Its callback runs once per
    /// [`trigger_event`](Self::trigger_event), on a later step.
    pub fn add_event<F>(&mut self, callback: F) -> Result<EventId>
    where
        F: FnMut(&mut Reactor<E>, E) + 'static,
    {
        self.events.try_reserve(1)?;
        let id = EventId(self.event_ids.next()?);

        let callback: EventCallback<E> = Box::new(callback);
        self.events.insert(id, callback);

        debug!("added {id}");
        Ok(id)
    }

    /// Unregisters an event. Triggers already queued for it are dropped
    /// when they come due. Unknown ids are ignored.
    pub fn remove_event(&mut self, id: EventId) -> bool {
        let removed = self.events.remove(id);
        if removed {
            debug!("removed {id}");
        }

        removed
    }

    /// Queues a dispatch of event `id` carrying `data`.
    ///
    /// The callback does not run now: the trigger is inserted into the
    /// timer heap at the current time, after every entry already due and
    /// before anything due later. Triggering an unknown id does nothing and
    /// returns `Ok(false)`.
    pub fn trigger_event(&mut self, id: EventId, data: E) -> Result<bool> {
        if !self.events.contains(id) {
            trace!("ignoring trigger for unknown {id}");
            return Ok(false);
        }

        self.timers.try_reserve(1)?;

        let now = self.clock.now_us();
        self.timers.insert(TimerEntry::new(
            TRIGGER_ID,
            now,
            None,
            TimerPayload::Trigger { event: id, data },
        ));

        trace!("triggered {id} at {now}us");
        Ok(true)
    }

    /// Returns `true` if the event is registered.
    pub fn has_event(&self, id: EventId) -> bool {
        self.events.contains(id)
    }

    /// Number of registered events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // ── I/O ─────────────────────────────────────────────────────────

    /// Calls `callback` whenever `fd` is readable.
    ///
    /// Only [`Interest::READABLE`] is supported; any other interest is
    /// rejected with [`Error::UnsupportedInterest`]. The reactor does not
    /// own `fd` and never closes it.
    pub fn add_io_watch<F>(&mut self, fd: RawFd, interest: Interest, callback: F) -> Result<IoWatchId>
    where
        F: FnMut(&mut Reactor<E>, RawFd, Interest) + 'static,
    {
        if interest != Interest::READABLE {
            return Err(Error::UnsupportedInterest(interest));
        }

        self.io.try_reserve(1)?;
        let id = IoWatchId(self.io_ids.next()?);

        let callback: IoCallback<E> = Box::new(callback);
        self.io.insert(id, fd, interest, callback);

        debug!("added {id}: fd={fd} interest={interest:?}");
        Ok(id)
    }

    /// Stops watching. Unknown ids are ignored.
    pub fn remove_io_watch(&mut self, id: IoWatchId) -> bool {
        let removed = self.io.remove(id);
        if removed {
            debug!("removed {id}");
        }

        removed
    }

    /// Returns `true` if the watch is registered.
    pub fn has_io_watch(&self, id: IoWatchId) -> bool {
        self.io.contains(id)
    }

    /// Number of registered I/O watches.
    pub fn io_watch_count(&self) -> usize {
        self.io.len()
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Returns `true` when there is nothing to wait for: no timer, no
    /// pending trigger and no I/O watch.
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.io.is_empty()
    }

    /// Performs one unit of work.
    ///
    /// Returns `Ok(false)` immediately, without blocking, if the reactor is
    /// idle. Otherwise:
    /// 1. the wait bound is the time left until the earliest deadline, or
    ///    unbounded if no timer is pending;
    /// 2. watched descriptors are polled for at most that bound (in several
    ///    polls if it exceeds what `poll(2)` can express); if any are
    ///    readable, each still-registered watch's callback runs once and
    ///    the step ends;
    /// 3. otherwise the earliest heap entry is dequeued: a trigger runs its
    ///    event's callback (if the event is still registered); a timer
    ///    sleeps until its exact deadline, runs, and is re-armed if
    ///    periodic.
    pub fn step(&mut self) -> Result<bool> {
        if self.is_idle() {
            return Ok(false);
        }

        if !self.io.is_empty() {
            loop {
                let ready = self.poll_io()?;

                if !ready.is_empty() {
                    self.dispatch_io(ready);
                    return Ok(true);
                }

                // Deadline still beyond one poll's reach: keep polling.
                if !is_clamped(self.wait_bound()) {
                    break;
                }
            }
        }

        match self.timers.take() {
            Some(entry) => {
                self.dispatch_entry(entry)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Calls [`step`](Self::step) until the reactor is idle.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? {}
        Ok(())
    }

    /// Drops every timer, trigger, event and watch without running any
    /// callback. Ids handed out before remain invalid.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.events.clear();
        self.io.clear();

        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.rearm = false;
        }

        debug!("cleared all registrations");
    }

    /// Polls the watched descriptors, bounded by the earliest deadline.
    fn poll_io(&mut self) -> Result<Vec<Ready>> {
        loop {
            let timeout = self.wait_bound();

            match self.io.poll(timeout) {
                Ok(ready) => return Ok(ready),
                Err(Error::Poll(err)) if err.kind() == io::ErrorKind::Interrupted => {
                    trace!("poll interrupted, retrying");
                }
                Err(err) => {
                    warn!("readiness poll failed: {err}");
                    return Err(err);
                }
            }
        }
    }

    /// Time left until the earliest deadline; `None` if the heap is empty.
    fn wait_bound(&self) -> Option<Duration> {
        self.timers.peek().map(|entry| {
            let now = self.clock.now_us();
            Duration::from_micros(entry.deadline.saturating_sub(now))
        })
    }

    fn dispatch_io(&mut self, ready: Vec<Ready>) {
        for Ready { id, fd } in ready {
            // Removed by an earlier callback in this batch, or running
            // further up the stack.
            let Some(mut callback) = self.io.take_callback(id) else {
                trace!("skipping {id}: no longer dispatchable");
                continue;
            };

            trace!("dispatching {id}: fd={fd} readable");
            callback(self, fd, Interest::READABLE);
            self.io.restore_callback(id, callback);
        }
    }

    fn dispatch_entry(&mut self, entry: TimerEntry<TimerPayload<E>>) -> Result<()> {
        let TimerEntry {
            id,
            deadline,
            period,
            payload,
            ..
        } = entry;

        match payload {
            TimerPayload::Trigger { event, data } => self.dispatch_event(event, deadline, data),
            TimerPayload::Timer(mut callback) => {
                self.clock.sleep_until_us(deadline);

                trace!("dispatching {id}: deadline={deadline}us");

                let previous = self.in_flight.replace(InFlight {
                    id,
                    rearm: period.is_some(),
                });
                callback(self);
                let finished = mem::replace(&mut self.in_flight, previous);

                let rearm = finished.is_some_and(|in_flight| in_flight.rearm);
                if let (Some(period), true) = (period, rearm) {
                    self.timers.try_reserve(1)?;
                    self.timers.insert(TimerEntry::new(
                        id,
                        deadline.saturating_add(period),
                        Some(period),
                        TimerPayload::Timer(callback),
                    ));
                }

                Ok(())
            }
        }
    }

    fn dispatch_event(&mut self, id: EventId, deadline: u64, data: E) -> Result<()> {
        match self.events.take_callback(id) {
            Dispatch::Ready(mut callback) => {
                trace!("dispatching {id}");
                callback(self, data);

                let deferred = self.events.restore_callback(id, callback);
                if !deferred.is_empty() {
                    self.timers.try_reserve(deferred.len())?;
                    trace!("requeueing {} trigger(s) for {id}", deferred.len());
                }
                for (deadline, data) in deferred {
                    self.timers.insert(TimerEntry::new(
                        TRIGGER_ID,
                        deadline,
                        None,
                        TimerPayload::Trigger { event: id, data },
                    ));
                }
            }
            // Re-entered from the event's own callback: hold the trigger
            // until that callback returns.
            Dispatch::Busy => {
                trace!("deferring trigger for {id}: callback running");
                self.events.defer(id, deadline, data)?;
            }
            Dispatch::Unknown => trace!("dropping trigger for {id}: no longer registered"),
        }

        Ok(())
    }
}

impl<E> Default for Reactor<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn as_micros(duration: Duration) -> u64 {
    duration.as_micros().min(u64::MAX as u128) as u64
}
