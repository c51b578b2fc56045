//! # BackOff
//!
//! Exponential backoff for the busy-wait loop of [`SpinLock`](crate::SpinLock).
//!
//! Each call to [`BackOff::wait`] spins for `2^step` iterations of
//! [`core::hint::spin_loop`]. Past a fixed step limit the spinning
//! stops growing and the thread gives its time slice back with
//! [`std::thread::yield_now`].
//!
//! ## Example
//! ```rust
//! use contention_bench::BackOff;
//!
//! let backoff = BackOff::new();
//! for _ in 0..4 {
//!     backoff.wait();
//! }
//! assert!(!backoff.is_yielding());
//! ```

use core::{cell::Cell, hint::spin_loop};

/// Last step that still spins; beyond it `wait` yields.
const SPIN_LIMIT: u32 = 6;

/// Step is never advanced past this.
const STEP_CAP: u32 = 10;

/// Exponential backoff state for a single waiter.
///
/// Not `Sync`: every waiter creates its own.
pub struct BackOff {
    step: Cell<u32>,
}

impl BackOff {
    /// Creates a [`BackOff`] at step zero.
    ///
    /// # Examples
    /// ```
    /// use contention_bench::BackOff;
    /// let b = BackOff::new();
    /// assert_eq!(b.step(), 0);
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self { step: Cell::new(0) }
    }

    /// Waits once, spinning or yielding depending on how long we've waited.
    ///
    /// The first calls spin for 1, 2, 4, ... iterations; later calls call
    /// [`std::thread::yield_now`] instead.
    ///
    /// # Examples
    /// ```
    /// use contention_bench::BackOff;
    /// let b = BackOff::new();
    /// b.wait();
    /// b.wait();
    /// assert_eq!(b.step(), 2);
    /// ```
    #[inline]
    pub fn wait(&self) {
        let step = self.step.get();

        if step <= SPIN_LIMIT {
            for _ in 0..(1u32 << step) {
                spin_loop();
            }
        } else {
            std::thread::yield_now();
        }

        if step < STEP_CAP {
            self.step.set(step + 1);
        }
    }

    /// `true` once `wait` has stopped spinning and started yielding.
    ///
    /// # Examples
    /// ```
    /// use contention_bench::BackOff;
    /// let b = BackOff::new();
    /// while !b.is_yielding() {
    ///     b.wait();
    /// }
    /// assert!(b.step() > 0);
    /// ```
    #[inline]
    pub fn is_yielding(&self) -> bool {
        self.step.get() > SPIN_LIMIT
    }

    /// Current step.
    #[inline]
    pub fn step(&self) -> u32 {
        self.step.get()
    }

    /// Back to step zero.
    ///
    /// # Examples
    /// ```
    /// use contention_bench::BackOff;
    /// let b = BackOff::new();
    /// for _ in 0..5 {
    ///     b.wait();
    /// }
    /// b.reset();
    /// assert_eq!(b.step(), 0);
    /// ```
    #[inline]
    pub fn reset(&self) {
        self.step.set(0);
    }
}

impl Default for BackOff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_grows_then_caps() {
        let b = BackOff::new();

        let mut prev = b.step();
        for _ in 0..(STEP_CAP + 5) {
            b.wait();
            assert!(b.step() >= prev, "BackOff step went backwards");
            prev = b.step();
        }

        assert_eq!(b.step(), STEP_CAP);
    }

    #[test]
    fn test_switches_to_yielding() {
        let b = BackOff::new();

        for _ in 0..=SPIN_LIMIT {
            assert!(!b.is_yielding());
            b.wait();
        }

        assert!(b.is_yielding(), "BackOff should yield past the spin limit");
    }

    #[test]
    fn test_reset_behavior() {
        let b = BackOff::new();
        for _ in 0..8 {
            b.wait();
        }

        b.reset();
        assert_eq!(b.step(), 0);
        assert!(!b.is_yielding());
    }
}
