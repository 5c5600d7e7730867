use super::Reactor;
use super::id::IoWatchId;
use super::poller::common::{Interest, timeout_ms};
use super::poller::platform::sys_poll;

use crate::error::Error;

use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, pollfd};
use std::collections::TryReserveError;
use std::os::fd::RawFd;
use std::time::Duration;

/// Callback run when a watched descriptor becomes ready.
///
/// Receives the descriptor and the readiness that was observed. Draining
/// the descriptor is the callback's job; a descriptor left readable is
/// reported again on the next step.
pub type IoCallback<E> = Box<dyn FnMut(&mut Reactor<E>, RawFd, Interest)>;

/// Revents that mean a `read(2)` on the descriptor will not block.
const READ_READY: libc::c_short = POLLIN | POLLHUP | POLLERR;

/// A registered I/O watch.
struct IoWatch<E> {
    id: IoWatchId,
    fd: RawFd,

    /// `None` while the callback is running.
    callback: Option<IoCallback<E>>,
}

/// A watch reported ready by the last poll.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ready {
    pub(crate) id: IoWatchId,
    pub(crate) fd: RawFd,
}

/// Table of I/O watches and the `pollfd` buffer handed to `poll(2)`.
///
/// `watches[i]` and `fds[i]` always describe the same registration: every
/// insertion and removal is applied to both vectors at the same index.
pub(crate) struct IoTable<E> {
    watches: Vec<IoWatch<E>>,
    fds: Vec<pollfd>,
}

impl<E> IoTable<E> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            watches: Vec::with_capacity(capacity),
            fds: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.watches.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.watches.try_reserve(additional)?;
        self.fds.try_reserve(additional)
    }

    /// Appends a watch. Capacity must have been reserved in both vectors.
    pub(crate) fn insert(
        &mut self,
        id: IoWatchId,
        fd: RawFd,
        interest: Interest,
        callback: IoCallback<E>,
    ) {
        self.watches.push(IoWatch {
            id,
            fd,
            callback: Some(callback),
        });
        self.fds.push(pollfd {
            fd,
            events: interest.to_poll_events(),
            revents: 0,
        });

        debug_assert_eq!(self.watches.len(), self.fds.len());
    }

    pub(crate) fn contains(&self, id: IoWatchId) -> bool {
        self.position(id).is_some()
    }

    /// Removes the watch and its `pollfd`, shifting later entries down.
    pub(crate) fn remove(&mut self, id: IoWatchId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.watches.remove(index);
                self.fds.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_callback(&mut self, id: IoWatchId) -> Option<IoCallback<E>> {
        let index = self.position(id)?;
        self.watches[index].callback.take()
    }

    pub(crate) fn restore_callback(&mut self, id: IoWatchId, callback: IoCallback<E>) {
        if let Some(index) = self.position(id) {
            self.watches[index].callback = Some(callback);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.watches.clear();
        self.fds.clear();
    }

    /// Polls every watched descriptor for readability.
    ///
    /// Blocks for at most `timeout` (forever if `None`) and returns the
    /// watches that became ready, in table order. Interrupted polls are
    /// returned as errors of kind [`std::io::ErrorKind::Interrupted`].
    pub(crate) fn poll(&mut self, timeout: Option<Duration>) -> Result<Vec<Ready>, Error> {
        for pfd in &mut self.fds {
            pfd.revents = 0;
        }

        let count = sys_poll(&mut self.fds, timeout_ms(timeout))?;

        let mut ready = Vec::with_capacity(count);
        if count == 0 {
            return Ok(ready);
        }

        for (watch, pfd) in self.watches.iter().zip(&self.fds) {
            if pfd.revents & POLLNVAL != 0 {
                return Err(Error::InvalidDescriptor(watch.fd));
            }

            if pfd.revents & READ_READY != 0 {
                ready.push(Ready {
                    id: watch.id,
                    fd: watch.fd,
                });
            }
        }

        Ok(ready)
    }

    fn position(&self, id: IoWatchId) -> Option<usize> {
        self.watches.iter().position(|watch| watch.id == id)
    }
}
