use std::fmt;
use std::time::Duration;

/// The kind of readiness an I/O watch waits for.
///
/// Only [`Interest::READABLE`] can currently be registered; the reactor
/// rejects every other value with [`Error::UnsupportedInterest`].
///
/// [`Error::UnsupportedInterest`]: crate::Error::UnsupportedInterest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interest {
    read: bool,
    write: bool,
}

impl Interest {
    /// Data can be read without blocking.
    pub const READABLE: Self = Self {
        read: true,
        write: false,
    };

    /// Data can be written without blocking. Not supported by the reactor.
    pub const WRITABLE: Self = Self {
        read: false,
        write: true,
    };

    /// Returns `true` if this interest includes readability.
    pub fn is_readable(self) -> bool {
        self.read
    }

    /// Returns `true` if this interest includes writability.
    pub fn is_writable(self) -> bool {
        self.write
    }

    /// Combines two interests.
    pub const fn add(self, other: Self) -> Self {
        Self {
            read: self.read || other.read,
            write: self.write || other.write,
        }
    }

    pub(crate) fn to_poll_events(self) -> libc::c_short {
        let mut events = 0;

        if self.read {
            events |= libc::POLLIN;
        }
        if self.write {
            events |= libc::POLLOUT;
        }

        events
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.read, self.write) {
            (true, true) => f.write_str("READABLE | WRITABLE"),
            (true, false) => f.write_str("READABLE"),
            (false, true) => f.write_str("WRITABLE"),
            (false, false) => f.write_str("(empty)"),
        }
    }
}

/// Longest wait a single `poll(2)` call can express.
pub(crate) const MAX_POLL_TIMEOUT: Duration = Duration::from_millis(libc::c_int::MAX as u64);

/// Converts an optional wait bound into a `poll(2)` timeout.
///
/// The bound is rounded down to whole milliseconds so the poll never
/// overshoots a timer deadline; `None` means wait forever. Bounds past
/// [`MAX_POLL_TIMEOUT`] are clamped to it.
pub(crate) fn timeout_ms(timeout: Option<Duration>) -> libc::c_int {
    timeout
        .map(|t| t.min(MAX_POLL_TIMEOUT).as_millis() as libc::c_int)
        .unwrap_or(-1)
}

/// Returns `true` if a poll for `timeout` ends before the bound elapses,
/// so the caller must poll again rather than fall through to its timers.
pub(crate) fn is_clamped(timeout: Option<Duration>) -> bool {
    timeout.is_some_and(|t| t > MAX_POLL_TIMEOUT)
}
