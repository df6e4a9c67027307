use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use super::signal::CancelSignal;

/// Busy-waiting mutual exclusion usable without an OS.
///
/// Besides the plain [`lock`](SpinLock::lock), a wait can be abandoned when
/// a [`CancelSignal`] is raised, see
/// [`lock_interruptible`](SpinLock::lock_interruptible).
pub struct SpinLock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: SpinLock can be shared between threads if T can be sent between threads
unsafe impl<T: Send> Sync for SpinLock<T> {}
unsafe impl<T: Send> Send for SpinLock<T> {}

/// The lock wait was abandoned because the caller's signal was raised.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock wait interrupted")
    }
}

impl<T> SpinLock<T> {
    /// An unlocked lock around `data`.
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    #[inline(always)]
    fn acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Spin until the lock is free, then take it.
    ///
    /// ```
    /// use common::sync::SpinLock;
    ///
    /// let counter = SpinLock::new(0u32);
    /// *counter.lock() += 1;
    /// assert_eq!(*counter.lock(), 1);
    /// ```
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        while !self.acquire() {
            core::hint::spin_loop();
        }
        SpinLockGuard { lock: self }
    }

    /// Attempts to acquire the lock without spinning.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        if self.acquire() {
            Some(SpinLockGuard { lock: self })
        } else {
            None
        }
    }

    /// Acquires the lock unless `signal` is raised while waiting.
    ///
    /// An uncontended lock is taken even if the signal is already raised;
    /// the signal is only consulted once the fast path has failed.
    pub fn lock_interruptible(
        &self,
        signal: &dyn CancelSignal,
    ) -> Result<SpinLockGuard<'_, T>, Interrupted> {
        loop {
            if self.acquire() {
                return Ok(SpinLockGuard { lock: self });
            }
            if signal.is_raised() {
                return Err(Interrupted);
            }
            core::hint::spin_loop();
        }
    }

    /// Returns a mutable reference to the data without locking.
    ///
    /// Exclusive access is guaranteed statically by `&mut self`.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<T: fmt::Debug> fmt::Debug for SpinLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("SpinLock").field("data", &*guard).finish(),
            None => f.debug_struct("SpinLock").field("data", &"<locked>").finish(),
        }
    }
}

/// Exclusive access to a [`SpinLock`]'s data; unlocks on drop.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> core::ops::Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: The lock is held, so we have exclusive access
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> core::ops::DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: The lock is held, so we have exclusive access
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    /// Releases the lock when the guard goes out of scope.
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}
