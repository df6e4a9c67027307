use core::sync::atomic::{AtomicBool, Ordering};

/// Cancellation source consulted while waiting for a lock.
///
/// Implemented by whatever delivers asynchronous cancellation to a caller
/// (a pending signal on a process, a shutdown flag on a worker, ...).
pub trait CancelSignal: Send + Sync {
    /// Returns `true` once the waiter should give up.
    fn is_raised(&self) -> bool;
}

/// A signal that is never raised.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignal;

impl CancelSignal for NoSignal {
    #[inline(always)]
    fn is_raised(&self) -> bool {
        false
    }
}

/// Atomic flag that can be raised from any context and cleared by its owner.
#[derive(Debug, Default)]
pub struct SignalFlag {
    raised: AtomicBool,
}

impl SignalFlag {
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Raise the signal. Waiters observe it on their next spin.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Clear the signal, returning whether it was raised.
    pub fn clear(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }
}

impl CancelSignal for SignalFlag {
    #[inline(always)]
    fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
