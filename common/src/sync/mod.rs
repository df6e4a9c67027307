pub mod signal;
pub mod spinlock;
pub use signal::{CancelSignal, NoSignal, SignalFlag};
pub use spinlock::{Interrupted, SpinLock, SpinLockGuard};
