//! Deadline-ordered timer heap.
//!
//! An array-backed binary min-heap. Entries are ordered by deadline; equal
//! deadlines come out in insertion order, which keeps triggered events FIFO
//! when the clock has not advanced between two triggers.

use super::id::TimerId;

use std::collections::TryReserveError;

/// An entry in the timer heap.
///
/// `TimerEntry` represents a scheduled firing at an absolute monotonic
/// deadline. The reactor stores both real timers and deferred event
/// triggers as entries, distinguished only by their payload.
#[derive(Debug)]
pub struct TimerEntry<P> {
    /// Identifier used by [`TimerHeap::remove_by_id`].
    pub id: TimerId,

    /// Absolute deadline in monotonic microseconds.
    pub deadline: u64,

    /// Re-arm period in microseconds, `None` for one-shot entries.
    pub period: Option<u64>,

    /// What to do when the entry is dequeued.
    pub payload: P,

    /// Insertion sequence number, used to break deadline ties.
    seq: u64,
}

impl<P> TimerEntry<P> {
    /// Creates a new entry. The tie-break sequence is assigned on insertion.
    pub fn new(id: TimerId, deadline: u64, period: Option<u64>, payload: P) -> Self {
        Self {
            id,
            deadline,
            period,
            payload,
            seq: 0,
        }
    }

    fn sort_key(&self) -> (u64, u64) {
        (self.deadline, self.seq)
    }
}

/// A binary min-heap of [`TimerEntry`] values keyed by deadline.
///
/// # Examples
///
/// ```rust
/// use evloop::heap::{TimerEntry, TimerHeap};
/// use evloop::TimerId;
///
/// let mut heap = TimerHeap::new();
/// heap.insert(TimerEntry::new(TimerId::from_raw(1), 200, None, ()));
/// heap.insert(TimerEntry::new(TimerId::from_raw(2), 100, None, ()));
///
/// assert_eq!(heap.take().map(|e| e.deadline), Some(100));
/// assert_eq!(heap.take().map(|e| e.deadline), Some(200));
/// assert!(heap.take().is_none());
/// ```
#[derive(Debug)]
pub struct TimerHeap<P> {
    data: Vec<TimerEntry<P>>,
    next_seq: u64,
}

impl<P> TimerHeap<P> {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            next_seq: 0,
        }
    }

    /// Creates an empty heap able to hold `capacity` entries without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Number of entries in the heap.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the heap holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reserves room for `additional` more entries.
    ///
    /// Calling this before [`insert`](Self::insert) turns an allocation
    /// failure into an error instead of an abort.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.data.try_reserve(additional)
    }

    /// Inserts an entry, sifting it up toward the root. O(log n).
    pub fn insert(&mut self, mut entry: TimerEntry<P>) {
        entry.seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        self.data.push(entry);
        self.sift_up(self.data.len() - 1);
    }

    /// Returns the entry with the earliest deadline without removing it.
    pub fn peek(&self) -> Option<&TimerEntry<P>> {
        self.data.first()
    }

    /// Removes and returns the entry with the earliest deadline. O(log n).
    pub fn take(&mut self) -> Option<TimerEntry<P>> {
        if self.data.is_empty() {
            return None;
        }

        // Replace the root with the last element and restore order downward.
        let entry = self.data.swap_remove(0);
        self.sift_down(0);

        Some(entry)
    }

    /// Removes the entry whose id is `id`. O(n) lookup, O(log n) repair.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove_by_id(&mut self, id: TimerId) -> bool {
        match self.data.iter().position(|entry| entry.id == id) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if an entry with `id` is queued.
    pub fn contains(&self, id: TimerId) -> bool {
        self.data.iter().any(|entry| entry.id == id)
    }

    /// Iterates over all entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &TimerEntry<P>> {
        self.data.iter()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    fn remove_at(&mut self, index: usize) -> TimerEntry<P> {
        let entry = self.data.swap_remove(index);

        // The element moved into `index` came from the last level and may
        // belong either above or below its new position.
        if index < self.data.len() && !self.sift_down(index) {
            self.sift_up(index);
        }

        entry
    }

    /// Moves the element at `index` up while it is smaller than its parent.
    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;

            if self.data[index].sort_key() >= self.data[parent].sort_key() {
                break;
            }

            self.data.swap(index, parent);
            index = parent;
        }
    }

    /// Moves the element at `index` down while it is larger than its
    /// smaller child. Returns `true` if at least one swap happened.
    fn sift_down(&mut self, mut index: usize) -> bool {
        let len = self.data.len();
        let mut moved = false;

        loop {
            let left = 2 * index + 1;
            let right = left + 1;

            if left >= len {
                break;
            }

            let child = if right < len && self.data[right].sort_key() < self.data[left].sort_key()
            {
                right
            } else {
                left
            };

            if self.data[index].sort_key() <= self.data[child].sort_key() {
                break;
            }

            self.data.swap(index, child);
            index = child;
            moved = true;
        }

        moved
    }
}

impl<P> Default for TimerHeap<P> {
    fn default() -> Self {
        Self::new()
    }
}
