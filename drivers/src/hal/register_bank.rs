//! Register Bank Hardware Abstraction Layer
//!
//! A register bank is a fixed-size window of 32-bit registers addressed by
//! byte offset. Drivers talk to a bank through [`RegisterBank`] rather than
//! raw pointers, so the same driver runs against MMIO or a simulated bank.
//!
//! # Architecture
//!
//! ```text
//! Platform Driver (PinController, ...)
//!           ↓
//! Register Bank HAL ← You are here
//!           ↓
//! MMIO window (MmioBank) or simulation (SimBank)
//! ```
//!
//! A bank is acquired from a [`RegisterMapper`] and released when it is
//! dropped; implementations tie the lifetime of the mapping to the value.

use alloc::boxed::Box;
use core::fmt;

/// Offset-addressed access to a window of 32-bit registers.
///
/// Offsets are in bytes and must be 4-byte aligned and lie within
/// [`size`](RegisterBank::size).
pub trait RegisterBank {
    /// Size of the window in bytes.
    fn size(&self) -> usize;

    /// Read the register at `offset`.
    fn read32(&self, offset: usize) -> u32;

    /// Write `value` to the register at `offset`.
    fn write32(&mut self, offset: usize, value: u32);

    /// Read-modify-write the register at `offset`.
    fn modify32<F>(&mut self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
        Self: Sized,
    {
        let value = self.read32(offset);
        self.write32(offset, f(value));
    }
}

impl<B: RegisterBank + ?Sized> RegisterBank for Box<B> {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }
}

/// Acquires register banks for physical register windows.
pub trait RegisterMapper {
    /// Bank produced by this mapper. Dropping it releases the mapping.
    type Bank: RegisterBank + Send + 'static;

    /// Map `size` bytes of registers starting at physical address `phys`.
    fn map(&self, phys: usize, size: usize) -> Result<Self::Bank, MapError>;
}

/// Register window mapping errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Base address is not register aligned.
    Unaligned,
    /// The window is empty or does not fit the address space.
    OutOfRange,
    /// The mapping could not be established.
    Unavailable,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Unaligned => write!(f, "register window is not aligned"),
            MapError::OutOfRange => write!(f, "register window out of range"),
            MapError::Unavailable => write!(f, "register window unavailable"),
        }
    }
}

/// Check that `offset` addresses a whole register inside a bank of `size` bytes.
#[inline]
pub fn offset_in_bounds(offset: usize, size: usize) -> bool {
    offset % 4 == 0 && offset.checked_add(4).is_some_and(|end| end <= size)
}
