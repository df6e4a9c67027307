use alloc::sync::Arc;
use core::fmt;

use common::sync::{CancelSignal, NoSignal};

/// Identity of an activated device, used to reject foreign sessions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub(crate) usize);

/// One caller's open handle on a device.
///
/// Owns the read/write cursor, which starts at 0 and only moves forward by
/// the number of bytes actually transferred. Reopening is the only way back
/// to the start.
pub struct Session {
    pub(crate) device: DeviceId,
    pub(crate) position: usize,
    pub(crate) served_status: bool,
    signal: Option<Arc<dyn CancelSignal>>,
}

impl Session {
    pub(crate) fn new(device: DeviceId, signal: Option<Arc<dyn CancelSignal>>) -> Self {
        Self {
            device,
            position: 0,
            served_status: false,
            signal,
        }
    }

    /// Current cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Signal consulted while this session waits for the device lock.
    pub(crate) fn signal(&self) -> &dyn CancelSignal {
        match &self.signal {
            Some(signal) => &**signal,
            None => &NoSignal,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("device", &self.device)
            .field("position", &self.position)
            .field("served_status", &self.served_status)
            .field("cancellable", &self.signal.is_some())
            .finish()
    }
}
