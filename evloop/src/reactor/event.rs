use super::Reactor;
use super::id::EventId;

use std::collections::TryReserveError;

/// Callback run when a triggered event is dispatched.
///
/// The second argument is the value passed to `trigger_event`.
pub type EventCallback<E> = Box<dyn FnMut(&mut Reactor<E>, E)>;

/// A registered event.
struct Event<E> {
    id: EventId,

    /// `None` while the callback is running.
    callback: Option<EventCallback<E>>,

    /// Triggers that came due while the callback was running, with their
    /// original deadlines. Requeued when the callback is restored.
    deferred: Vec<(u64, E)>,
}

/// Outcome of looking up an event for dispatch.
pub(crate) enum Dispatch<E> {
    /// The callback, moved out of the table.
    Ready(EventCallback<E>),

    /// The callback is running further up the stack.
    Busy,

    /// No such event.
    Unknown,
}

/// Dense table of registered events.
///
/// Order is irrelevant; removal compacts the table so no dead slot is ever
/// dispatched.
pub(crate) struct EventTable<E> {
    entries: Vec<Event<E>>,
}

impl<E> EventTable<E> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.entries.try_reserve(additional)
    }

    /// Appends a registration. Capacity must have been reserved.
    pub(crate) fn insert(&mut self, id: EventId, callback: EventCallback<E>) {
        self.entries.push(Event {
            id,
            callback: Some(callback),
            deferred: Vec::new(),
        });
    }

    pub(crate) fn contains(&self, id: EventId) -> bool {
        self.position(id).is_some()
    }

    /// Removes the registration, shifting later entries down.
    pub(crate) fn remove(&mut self, id: EventId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Moves the callback out for dispatch.
    pub(crate) fn take_callback(&mut self, id: EventId) -> Dispatch<E> {
        let Some(index) = self.position(id) else {
            return Dispatch::Unknown;
        };

        match self.entries[index].callback.take() {
            Some(callback) => Dispatch::Ready(callback),
            None => Dispatch::Busy,
        }
    }

    /// Parks a trigger for an event whose callback is running. Unknown
    /// ids drop the trigger.
    pub(crate) fn defer(
        &mut self,
        id: EventId,
        deadline: u64,
        data: E,
    ) -> Result<(), TryReserveError> {
        if let Some(index) = self.position(id) {
            let deferred = &mut self.entries[index].deferred;
            deferred.try_reserve(1)?;
            deferred.push((deadline, data));
        }

        Ok(())
    }

    /// Puts a callback back after dispatch, if the event is still
    /// registered, and hands back the triggers deferred meanwhile.
    pub(crate) fn restore_callback(
        &mut self,
        id: EventId,
        callback: EventCallback<E>,
    ) -> Vec<(u64, E)> {
        match self.position(id) {
            Some(index) => {
                let event = &mut self.entries[index];
                event.callback = Some(callback);
                std::mem::take(&mut event.deferred)
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, id: EventId) -> Option<usize> {
        self.entries.iter().position(|event| event.id == id)
    }
}
