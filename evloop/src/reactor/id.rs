use crate::error::{Error, Result};

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Wraps a raw value. Ids forged this way only ever match
            /// registrations that were handed out with the same value.
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw numeric value of this identifier.
            pub fn as_u32(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a one-shot or periodic timer.
    TimerId
);

define_id!(
    /// Handle to a registered event.
    EventId
);

define_id!(
    /// Handle to a registered I/O watch.
    IoWatchId
);

/// Strictly increasing id source for one namespace.
///
/// Ids start at 1 and are never reused: once `u32::MAX` has been handed
/// out, every further allocation fails with [`Error::IdsExhausted`].
pub(crate) struct IdGenerator {
    next: u32,
    namespace: &'static str,
}

impl IdGenerator {
    pub(crate) const fn new(namespace: &'static str) -> Self {
        Self { next: 1, namespace }
    }

    /// Returns the id the next call to [`next`](Self::next) would hand out,
    /// without consuming it.
    pub(crate) fn peek(&self) -> Result<u32> {
        if self.next == 0 {
            Err(Error::IdsExhausted(self.namespace))
        } else {
            Ok(self.next)
        }
    }

    /// Consumes and returns the next id.
    ///
    /// After `u32::MAX` the counter parks at 0, which `peek` treats as
    /// exhausted.
    pub(crate) fn next(&mut self) -> Result<u32> {
        let id = self.peek()?;
        self.next = id.checked_add(1).unwrap_or(0);
        Ok(id)
    }

    #[cfg(test)]
    pub(crate) fn starting_at(namespace: &'static str, next: u32) -> Self {
        Self { next, namespace }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing_from_one() {
        let mut ids = IdGenerator::new("timer");
        assert_eq!(ids.next().unwrap(), 1);
        assert_eq!(ids.next().unwrap(), 2);
        assert_eq!(ids.peek().unwrap(), 3);
        assert_eq!(ids.next().unwrap(), 3);
    }

    #[test]
    fn exhaustion_is_reported_instead_of_wrapping() {
        let mut ids = IdGenerator::starting_at("event", u32::MAX);
        assert_eq!(ids.next().unwrap(), u32::MAX);
        assert!(matches!(ids.next(), Err(Error::IdsExhausted("event"))));
        assert!(matches!(ids.peek(), Err(Error::IdsExhausted("event"))));
    }
}
