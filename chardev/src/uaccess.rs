//! Copies across the caller memory boundary.
//!
//! Device entry points never touch caller memory directly; they go through
//! [`UserSource`] and [`UserSink`], whose copies may fault. Kernel-side
//! slices and arrays never fault.

use alloc::vec::Vec;
use core::fmt;

/// Caller memory could not be accessed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Fault;

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad address")
    }
}

/// Caller memory a write reads from.
pub trait UserSource {
    /// Bytes offered by the caller.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the first `dst.len()` bytes into `dst`. `dst.len() <= self.len()`.
    ///
    /// On failure the contents of `dst` are unspecified.
    fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), Fault>;
}

/// Caller memory a read writes into.
pub trait UserSink {
    /// Bytes the caller can accept.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `src` to the start of the caller buffer. `src.len() <= self.len()`.
    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), Fault>;
}

impl UserSource for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), Fault> {
        let src = self.get(..dst.len()).ok_or(Fault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl<const N: usize> UserSource for [u8; N] {
    fn len(&self) -> usize {
        N
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), Fault> {
        self.as_slice().copy_from_user(dst)
    }
}

impl UserSource for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), Fault> {
        self.as_slice().copy_from_user(dst)
    }
}

impl UserSink for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), Fault> {
        let dst = self.get_mut(..src.len()).ok_or(Fault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl<const N: usize> UserSink for [u8; N] {
    fn len(&self) -> usize {
        N
    }

    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), Fault> {
        self.as_mut_slice().copy_to_user(src)
    }
}

impl UserSink for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), Fault> {
        self.as_mut_slice().copy_to_user(src)
    }
}
