use core::fmt;

use common::sync::Interrupted;
use drivers::hal::register_bank::MapError;
use drivers::platform::bcm2835::gpio::GpioError;

use crate::uaccess::Fault;

/// Linux error numbers reported by [`DevError::errno`].
pub mod errno {
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EINVAL: i32 = 22;
    pub const ENOSPC: i32 = 28;
    pub const ERESTARTSYS: i32 = 512;
}

/// Failure to bring a device up. Nothing acquired by the attempt survives it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActivationError {
    /// The configuration cannot describe a working device.
    InvalidConfig,
    /// Buffer storage could not be allocated.
    OutOfMemory,
    /// The register window could not be mapped.
    Map(MapError),
    /// The mapped bank cannot drive the configured pin.
    Gpio(GpioError),
}

impl From<MapError> for ActivationError {
    fn from(err: MapError) -> Self {
        ActivationError::Map(err)
    }
}

impl From<GpioError> for ActivationError {
    fn from(err: GpioError) -> Self {
        ActivationError::Gpio(err)
    }
}

impl fmt::Display for ActivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationError::InvalidConfig => write!(f, "invalid device configuration"),
            ActivationError::OutOfMemory => write!(f, "failed to allocate buffer"),
            ActivationError::Map(err) => write!(f, "failed to map GPIO registers: {}", err),
            ActivationError::Gpio(err) => write!(f, "GPIO setup failed: {}", err),
        }
    }
}

/// Errors returned by device operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DevError {
    /// Resource exhausted: the cursor already sits at buffer capacity.
    OutOfSpace,
    /// The lock wait was cancelled; no state changed.
    Interrupted,
    /// Caller memory could not be copied; no progress was made.
    Fault,
    /// Zero-length control write, or a session/handle this device does not own.
    InvalidArgument,
    Activation(ActivationError),
}

impl DevError {
    /// Negated by transports that return `-errno`.
    pub const fn errno(&self) -> i32 {
        match self {
            DevError::OutOfSpace => errno::ENOSPC,
            DevError::Interrupted => errno::ERESTARTSYS,
            DevError::Fault => errno::EFAULT,
            DevError::InvalidArgument => errno::EINVAL,
            DevError::Activation(ActivationError::OutOfMemory | ActivationError::Map(_)) => {
                errno::ENOMEM
            }
            DevError::Activation(_) => errno::EINVAL,
        }
    }
}

impl From<Interrupted> for DevError {
    fn from(_: Interrupted) -> Self {
        DevError::Interrupted
    }
}

impl From<Fault> for DevError {
    fn from(_: Fault) -> Self {
        DevError::Fault
    }
}

impl From<ActivationError> for DevError {
    fn from(err: ActivationError) -> Self {
        DevError::Activation(err)
    }
}

impl fmt::Display for DevError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevError::OutOfSpace => write!(f, "no space left on device"),
            DevError::Interrupted => write!(f, "interrupted while waiting for device"),
            DevError::Fault => write!(f, "bad address"),
            DevError::InvalidArgument => write!(f, "invalid argument"),
            DevError::Activation(err) => write!(f, "activation failed: {}", err),
        }
    }
}
