use super::Reactor;
use super::id::{EventId, TimerId};

use std::fmt;

/// Callback run when a timer fires.
pub type TimerCallback<E> = Box<dyn FnMut(&mut Reactor<E>)>;

/// What a [`TimerEntry`](super::heap::TimerEntry) in the reactor's heap
/// does when it is dequeued.
pub(crate) enum TimerPayload<E> {
    /// A timer registered through `add_timer` / `add_periodic_timer`.
    Timer(TimerCallback<E>),

    /// A deferred `trigger_event`. Due as soon as it is inserted.
    Trigger { event: EventId, data: E },
}

impl<E> fmt::Debug for TimerPayload<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerPayload::Timer(_) => f.write_str("Timer"),
            TimerPayload::Trigger { event, .. } => {
                f.debug_struct("Trigger").field("event", event).finish()
            }
        }
    }
}

/// Id carried by trigger entries. Never handed out by the timer id
/// generator, so `remove_timer` cannot reach a pending trigger.
pub(crate) const TRIGGER_ID: TimerId = TimerId(0);

/// The timer whose callback is currently running.
///
/// A periodic timer is out of the heap while its callback runs; removing
/// it from inside the callback clears `rearm` so it is not reinserted.
#[derive(Clone, Copy, Debug)]
pub(crate) struct InFlight {
    pub(crate) id: TimerId,
    pub(crate) rearm: bool,
}
