#![allow(dead_code)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

use evloop::clock::ManualClock;
use evloop::{Reactor, ReactorBuilder};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Installs a test logger once per test binary. Honors `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A reactor on virtual time starting at zero, plus a handle to its clock.
pub fn manual_reactor<E>() -> (Reactor<E>, ManualClock) {
    init_logging();

    let clock = ManualClock::new();
    let reactor = ReactorBuilder::new()
        .clock(clock.clone())
        .build()
        .expect("default capacities always fit");

    (reactor, clock)
}

/// A shared call counter.
#[derive(Clone, Default)]
pub struct Counter(Rc<Cell<usize>>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

/// A shared, append-only log of observed values.
#[derive(Clone)]
pub struct Record<T>(Rc<RefCell<Vec<T>>>);

impl<T: Clone> Record<T> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn push(&self, value: T) {
        self.0.borrow_mut().push(value);
    }

    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Deterministic 64-bit mix used to derive pseudo-random deadlines.
pub fn hash64(mut n: u64) -> u64 {
    n ^= n >> 33;
    n = n.wrapping_mul(0xff51afd7ed558ccd);
    n ^= n >> 33;
    n = n.wrapping_mul(0xc4ceb9fe1a85ec53);
    n ^= n >> 33;
    n
}
