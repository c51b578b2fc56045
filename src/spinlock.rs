//! # SpinLock
//!
//! A test-and-set spin lock that counts how often it was found held.
//!
//! This is the second lock primitive available to the Locking discipline
//! (the first being [`std::sync::Mutex`]). Unlike the OS mutex it never parks
//! a thread, and it reports [`SpinLock::contended`]: the number of
//! [`lock`](SpinLock::lock) calls whose first swap failed. A benchmark run
//! surfaces that number as a direct measure of contention.
//!
//! ## Example
//! ```rust
//! use contention_bench::SpinLock;
//!
//! let lock = SpinLock::new(0u64);
//! {
//!     let mut guard = lock.lock();
//!     *guard += 1;
//! }
//! assert_eq!(*lock.lock(), 1);
//! assert_eq!(lock.contended(), 0);
//! ```
//!
//! ## Caveats
//! - Not fair; a waiter can starve under heavy contention.
//! - Not reentrant.

use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{
    AtomicBool, AtomicU64,
    Ordering::{Acquire, Relaxed, Release},
};

use crate::BackOff;

/// Spin-based mutual exclusion around a `T`.
pub struct SpinLock<T> {
    locked: AtomicBool,
    contended: AtomicU64,
    data: UnsafeCell<T>,
}

/// Releases the [`SpinLock`] on drop.
///
/// Shareable across threads only when `T` itself is `Sync`, like
/// [`std::sync::MutexGuard`]:
///
/// ```compile_fail
/// use contention_bench::SpinLock;
/// use std::cell::Cell;
///
/// fn assert_sync<S: Sync>(_: &S) {}
///
/// let lock = SpinLock::new(Cell::new(0u32));
/// assert_sync(&lock.lock());
/// ```
pub struct SpinGuard<'a, T> {
    lock: &'a SpinLock<T>,
    _data: PhantomData<&'a mut T>,
}

impl<'a, T> SpinGuard<'a, T> {
    #[inline]
    fn new(lock: &'a SpinLock<T>) -> Self {
        SpinGuard {
            lock,
            _data: PhantomData,
        }
    }
}

impl<T> SpinLock<T> {
    /// Creates an unlocked lock wrapping `data`.
    ///
    /// # Example
    /// ```
    /// use contention_bench::SpinLock;
    ///
    /// let lock = SpinLock::new(123);
    /// assert!(!lock.is_locked());
    /// assert_eq!(*lock.lock(), 123);
    /// ```
    #[inline]
    pub const fn new(data: T) -> Self {
        SpinLock {
            locked: AtomicBool::new(false),
            contended: AtomicU64::new(0),
            data: UnsafeCell::new(data),
        }
    }

    /// Acquires the lock, backing off while it is held elsewhere.
    ///
    /// A call that finds the lock held adds one to [`contended`](Self::contended),
    /// however long it then waits.
    #[inline]
    pub fn lock(&self) -> SpinGuard<'_, T> {
        if self.locked.swap(true, Acquire) {
            self.contended.fetch_add(1, Relaxed);

            let backoff = BackOff::new();
            // Spin on a plain load so waiters don't bounce the line with writes.
            loop {
                while self.locked.load(Relaxed) {
                    backoff.wait();
                }
                if !self.locked.swap(true, Acquire) {
                    break;
                }
            }
        }

        SpinGuard::new(self)
    }

    /// Acquires the lock only if it is free right now.
    ///
    /// # Example
    /// ```
    /// use contention_bench::SpinLock;
    ///
    /// let lock = SpinLock::new(0);
    /// let guard = lock.try_lock().unwrap();
    /// assert!(lock.try_lock().is_none());
    /// drop(guard);
    /// assert!(lock.try_lock().is_some());
    /// ```
    #[inline]
    pub fn try_lock(&self) -> Option<SpinGuard<'_, T>> {
        if self.locked.swap(true, Acquire) {
            None
        } else {
            Some(SpinGuard::new(self))
        }
    }

    /// Runs `f` with exclusive access and returns its result.
    ///
    /// # Example
    /// ```
    /// use contention_bench::SpinLock;
    ///
    /// let lock = SpinLock::new(1u64);
    /// let doubled = lock.with_lock(|n| {
    ///     *n *= 2;
    ///     *n
    /// });
    /// assert_eq!(doubled, 2);
    /// ```
    #[inline]
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    /// Whether the lock is held at this instant.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Acquire)
    }

    /// Number of `lock` calls that found the lock already held.
    #[inline]
    pub fn contended(&self) -> u64 {
        self.contended.load(Relaxed)
    }

    /// Consumes the lock, returning the protected value.
    ///
    /// # Example
    /// ```
    /// use contention_bench::SpinLock;
    ///
    /// let lock = SpinLock::new(String::from("done"));
    /// assert_eq!(lock.into_inner(), "done");
    /// ```
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Default> Default for SpinLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Drop for SpinGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.locked.store(false, Release);
    }
}

impl<T> Deref for SpinGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: the guard exists only while `locked` is held by us.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above, and `&mut self` makes the borrow unique.
        unsafe { &mut *self.lock.data.get() }
    }
}

// Safety: access to `data` is serialized through `locked`.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_basic_lock_unlock() {
        let lock = SpinLock::new(10);

        {
            let mut guard = lock.lock();
            *guard += 5;
            assert_eq!(*guard, 15);
            assert!(lock.is_locked());
        }

        assert!(!lock.is_locked(), "Lock should be released after guard drop");
        assert_eq!(lock.into_inner(), 15);
    }

    #[test]
    fn test_try_lock_while_held() {
        let lock = SpinLock::new(42);

        let guard = lock.lock();
        assert!(lock.try_lock().is_none(), "Lock should not be acquirable while held");

        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn test_uncontended_lock_counts_nothing() {
        let lock = SpinLock::new(0u64);
        for _ in 0..100 {
            lock.with_lock(|n| *n += 1);
        }
        assert_eq!(lock.contended(), 0);
        assert_eq!(*lock.lock(), 100);
    }

    #[test]
    fn test_guard_is_sync_for_sync_data() {
        fn assert_sync<S: Sync>(_: &S) {}

        let lock = SpinLock::new(AtomicU64::new(0));
        let guard = lock.lock();
        assert_sync(&guard);

        thread::scope(|s| {
            s.spawn(|| guard.fetch_add(1, Relaxed));
        });
        assert_eq!(guard.load(Relaxed), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let lock = SpinLock::new(0usize);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..10_000 {
                        *lock.lock() += 1;
                    }
                });
            }
        });

        assert_eq!(*lock.lock(), 8 * 10_000, "Counter should match total increments");
        assert!(lock.contended() <= 8 * 10_000);
    }

    #[test]
    fn test_waiter_is_counted_as_contended() {
        let lock = SpinLock::new(0u32);
        let guard = lock.lock();

        thread::scope(|s| {
            let waiter = s.spawn(|| {
                *lock.lock() += 1;
            });

            while lock.contended() == 0 {
                thread::yield_now();
            }
            drop(guard);
            waiter.join().unwrap();
        });

        assert_eq!(lock.contended(), 1);
        assert_eq!(*lock.lock(), 1);
    }
}
